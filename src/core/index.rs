//! Single-column secondary index
//!
//! Maps each distinct cell value (null included) to the ordered set of row
//! positions currently holding it.

use std::collections::{BTreeSet, HashMap};

use super::value::Value;

/// Value -> row positions lookup for one column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    entries: HashMap<Value, BTreeSet<usize>>,
}

impl Index {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the cells of one column, in row order
    pub fn build<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut index = Self::new();
        for (position, value) in cells.into_iter().enumerate() {
            index.add(value.clone(), position);
        }
        index
    }

    /// Record that `position` holds `value`
    pub fn add(&mut self, value: Value, position: usize) {
        self.entries.entry(value).or_default().insert(position);
    }

    /// Forget that `position` holds `value`; empty entries are dropped
    pub fn remove(&mut self, value: &Value, position: usize) {
        if let Some(positions) = self.entries.get_mut(value) {
            positions.remove(&position);
            if positions.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    /// Row positions holding `value`, ascending
    pub fn positions(&self, value: &Value) -> Vec<usize> {
        self.entries
            .get(value)
            .map(|positions| positions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Check whether any row holds `value`
    pub fn contains(&self, value: &Value) -> bool {
        self.entries.contains_key(value)
    }

    /// Number of distinct values
    pub fn distinct_values(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(value, positions)` entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &BTreeSet<usize>)> {
        self.entries.iter()
    }
}
