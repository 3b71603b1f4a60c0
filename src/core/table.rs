//! Table storage: schema, rows and secondary indices
//!
//! Rows are stored positionally in insertion order. Every mutation validates
//! its whole input before touching storage, so a failed insert, update or
//! remove leaves the table exactly as it was.

use std::collections::BTreeMap;

use super::condition::{Condition, RowView};
use super::error::{DatabaseError, Result};
use super::index::Index;
use super::schema::{ColumnDef, Schema};
use super::value::{DatabaseResult, DatabaseRow, Value};

/// A borrowed row seen through its table's schema
struct RowRef<'a> {
    schema: &'a Schema,
    values: &'a [Value],
}

impl RowView for RowRef<'_> {
    fn get(&self, column: &str) -> Option<&Value> {
        self.schema.position(column).map(|i| &self.values[i])
    }
}

/// A named-column table with typed rows
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
    indices: BTreeMap<String, Index>,
}

impl Table {
    /// Create an empty table
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            indices: BTreeMap::new(),
        }
    }

    /// Create a table from already positional rows, validating each cell.
    ///
    /// # Errors
    ///
    /// `SchemaError` for a row of the wrong width, otherwise the same
    /// errors as [`Table::insert`].
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(DatabaseError::schema(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    schema.len()
                )));
            }
            for (column, value) in schema.columns().iter().zip(row) {
                check_value(column, value)?;
            }
        }
        Ok(Self {
            schema,
            rows,
            indices: BTreeMap::new(),
        })
    }

    /// Table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Column definitions in positional order
    pub fn columns(&self) -> &[ColumnDef] {
        self.schema.columns()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positional rows in storage order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Copy of the row at `position` as a column -> value mapping
    pub fn row(&self, position: usize) -> Option<DatabaseRow> {
        self.rows.get(position).map(|values| self.to_record(values))
    }

    /// Insert one row.
    ///
    /// Columns missing from `values` resolve to null.
    ///
    /// # Errors
    ///
    /// - `ColumnNotFound` if `values` names a column the table lacks
    /// - `TypeMismatch` if a non-null value disagrees with its column type
    /// - `NotNullViolation` if a NOT NULL column resolves to null
    ///
    /// On error nothing is stored.
    pub fn insert(&mut self, mut values: DatabaseRow) -> Result<usize> {
        let mut row = Vec::with_capacity(self.schema.len());
        for column in self.schema.columns() {
            let value = values.remove(&column.name).unwrap_or(Value::Null);
            check_value(column, &value)?;
            row.push(value);
        }

        if let Some(unknown) = values.keys().min() {
            return Err(DatabaseError::column_not_found(unknown.as_str()));
        }

        let position = self.rows.len();
        for (name, index) in self.indices.iter_mut() {
            if let Some(col) = self.schema.position(name) {
                index.add(row[col].clone(), position);
            }
        }
        self.rows.push(row);
        Ok(position)
    }

    /// Rows matching `condition`, as copies in storage order.
    ///
    /// # Errors
    ///
    /// `SyntaxError` for malformed condition text, `ColumnNotFound` when it
    /// names an unknown column. Type mismatches inside the condition make a
    /// row not match rather than fail.
    pub fn select(&self, condition: &str) -> Result<DatabaseResult> {
        self.select_where(&Condition::parse(condition)?)
    }

    /// [`Table::select`] with an already parsed condition
    pub fn select_where(&self, condition: &Condition) -> Result<DatabaseResult> {
        Ok(self
            .matching_positions(condition)?
            .into_iter()
            .map(|i| self.to_record(&self.rows[i]))
            .collect())
    }

    /// Number of rows matching `condition`
    pub fn count(&self, condition: &str) -> Result<usize> {
        Ok(self
            .matching_positions(&Condition::parse(condition)?)?
            .len())
    }

    /// Apply `updates` to every row matching `condition`; returns the
    /// number of rows changed.
    ///
    /// # Errors
    ///
    /// Besides the condition errors of [`Table::select`]:
    /// - `ColumnNotFound` if an update names an unknown column
    /// - `TypeMismatch` if a new value disagrees with its column type
    /// - `NotNullViolation` if null is assigned to a NOT NULL column
    ///
    /// All assignments are validated before any row is touched.
    pub fn update(&mut self, condition: &str, updates: &DatabaseRow) -> Result<usize> {
        self.update_where(&Condition::parse(condition)?, updates)
    }

    /// [`Table::update`] with an already parsed condition
    pub fn update_where(&mut self, condition: &Condition, updates: &DatabaseRow) -> Result<usize> {
        let mut assignments = Vec::with_capacity(updates.len());
        for (name, value) in updates {
            let col = self.schema.require(name)?;
            check_value(&self.schema.columns()[col], value)?;
            assignments.push((col, value));
        }

        let matched = self.matching_positions(condition)?;
        for &position in &matched {
            for &(col, value) in &assignments {
                let old = std::mem::replace(&mut self.rows[position][col], value.clone());
                let name = &self.schema.columns()[col].name;
                if let Some(index) = self.indices.get_mut(name) {
                    index.remove(&old, position);
                    index.add(value.clone(), position);
                }
            }
        }
        Ok(matched.len())
    }

    /// Delete every row matching `condition`; returns the number removed.
    ///
    /// Remaining rows keep their relative order and every index is rebuilt,
    /// since compaction renumbers positions.
    pub fn remove(&mut self, condition: &str) -> Result<usize> {
        self.remove_where(&Condition::parse(condition)?)
    }

    /// [`Table::remove`] with an already parsed condition
    pub fn remove_where(&mut self, condition: &Condition) -> Result<usize> {
        let matched = self.matching_positions(condition)?;
        if matched.is_empty() {
            return Ok(0);
        }

        let mut doomed = matched.iter().peekable();
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| {
                if doomed.peek() == Some(&&i) {
                    doomed.next();
                    None
                } else {
                    Some(row)
                }
            })
            .collect();

        self.rebuild_indices();
        Ok(matched.len())
    }

    /// Build (or rebuild) the index on `column` from the current rows
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` if the table has no such column.
    pub fn create_index(&mut self, column: &str) -> Result<()> {
        let col = self.schema.require(column)?;
        let index = Index::build(self.rows.iter().map(|row| &row[col]));
        self.indices.insert(column.to_string(), index);
        Ok(())
    }

    /// Create the index on `column` only if it does not exist yet.
    /// Returns whether an index was built.
    pub fn auto_index(&mut self, column: &str) -> Result<bool> {
        if self.indices.contains_key(column) {
            return Ok(false);
        }
        self.create_index(column)?;
        Ok(true)
    }

    /// Index on `column`, if one was created
    pub fn index(&self, column: &str) -> Option<&Index> {
        self.indices.get(column)
    }

    /// Names of indexed columns, sorted
    pub fn indexed_columns(&self) -> impl Iterator<Item = &str> {
        self.indices.keys().map(String::as_str)
    }

    /// Positions of rows whose `column` equals `value`, ascending.
    /// Answered from the index when there is one.
    pub fn lookup(&self, column: &str, value: &Value) -> Result<Vec<usize>> {
        let col = self.schema.require(column)?;
        if let Some(index) = self.indices.get(column) {
            return Ok(index.positions(value));
        }
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col] == *value)
            .map(|(i, _)| i)
            .collect())
    }

    /// True iff no row holds a value equal to `value` in `column`.
    /// Null never collides.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` if the table has no such column.
    pub fn is_unique(&self, column: &str, value: &Value) -> Result<bool> {
        let col = self.schema.require(column)?;
        if value.is_null() {
            return Ok(true);
        }
        if let Some(index) = self.indices.get(column) {
            return Ok(!index.contains(value));
        }
        Ok(!self.rows.iter().any(|row| row[col] == *value))
    }

    fn matching_positions(&self, condition: &Condition) -> Result<Vec<usize>> {
        for column in condition.columns() {
            self.schema.require(column)?;
        }

        let mut matched = Vec::new();
        for (i, values) in self.rows.iter().enumerate() {
            let view = RowRef {
                schema: &self.schema,
                values,
            };
            if condition.matches(&view)? {
                matched.push(i);
            }
        }
        Ok(matched)
    }

    fn rebuild_indices(&mut self) {
        for (name, index) in self.indices.iter_mut() {
            if let Some(col) = self.schema.position(name) {
                *index = Index::build(self.rows.iter().map(|row| &row[col]));
            }
        }
    }

    fn to_record(&self, values: &[Value]) -> DatabaseRow {
        self.schema
            .names()
            .map(str::to_string)
            .zip(values.iter().cloned())
            .collect()
    }
}

fn check_value(column: &ColumnDef, value: &Value) -> Result<()> {
    if value.is_null() {
        if column.not_null {
            return Err(DatabaseError::not_null(column.name.as_str()));
        }
        return Ok(());
    }
    if !column.column_type.accepts(value) {
        return Err(DatabaseError::type_mismatch(
            &column.name,
            column.column_type.as_str(),
            value.type_name(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::ColumnType;
    use crate::core::value::row;

    fn users() -> Table {
        let schema = Schema::new(vec![
            ColumnDef::new("id", ColumnType::Int32).not_null(),
            ColumnDef::new("name", ColumnType::String),
            ColumnDef::new("is_admin", ColumnType::Bool),
        ])
        .unwrap();
        let mut table = Table::new(schema);
        for (id, name, admin) in [(1, "Alice", false), (2, "Bob", true), (3, "Charlie", false)] {
            table
                .insert(row([
                    ("id", Value::Int(id)),
                    ("name", Value::from(name)),
                    ("is_admin", Value::Bool(admin)),
                ]))
                .unwrap();
        }
        table
    }

    fn assert_index_consistent(table: &Table, column: &str) {
        let index = table.index(column).expect("index exists");
        let col = table.schema().position(column).unwrap();
        for (value, positions) in index.iter() {
            let expected: Vec<usize> = table
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, r)| r[col] == *value)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(positions.iter().copied().collect::<Vec<_>>(), expected);
        }
        for (i, r) in table.rows().iter().enumerate() {
            assert!(index.positions(&r[col]).contains(&i));
        }
    }

    #[test]
    fn test_insert_fills_missing_with_null() {
        let mut table = users();
        let pos = table.insert(row([("id", Value::Int(4))])).unwrap();
        assert_eq!(pos, 3);

        let r = table.row(3).unwrap();
        assert_eq!(r["id"], Value::Int(4));
        assert_eq!(r["name"], Value::Null);
        assert_eq!(r["is_admin"], Value::Null);
    }

    #[test]
    fn test_insert_type_mismatch_is_atomic() {
        let mut table = users();
        let err = table
            .insert(row([("id", Value::Int(4)), ("name", Value::Int(5))]))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::TypeMismatch { ref column, .. } if column == "name"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_insert_not_null_violation() {
        let mut table = users();
        let err = table.insert(row([("name", "Dave")])).unwrap_err();
        assert!(matches!(err, DatabaseError::NotNullViolation { .. }));

        let err = table
            .insert(row([("id", Value::Null), ("name", Value::from("Dave"))]))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotNullViolation { .. }));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_insert_unknown_column() {
        let mut table = users();
        let err = table
            .insert(row([("id", Value::Int(4)), ("age", Value::Int(30))]))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ColumnNotFound { ref column } if column == "age"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_select_filters_in_storage_order() {
        let table = users();
        let admins = table.select("is_admin=true").unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0]["name"], Value::from("Bob"));

        let all = table.select("true").unwrap();
        let ids: Vec<i32> = all.iter().filter_map(|r| r["id"].as_int()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(table.select("false").unwrap().is_empty());
        assert_eq!(table.count("is_admin=false").unwrap(), 2);
    }

    #[test]
    fn test_select_type_mismatch_is_no_match() {
        let table = users();
        assert!(table.select("id='1'").unwrap().is_empty());
        assert_eq!(table.select("NOT id='1'").unwrap().len(), 3);
    }

    #[test]
    fn test_select_unknown_column_fails_even_when_empty() {
        let table = Table::new(Schema::from_pairs([("id", "int32")]).unwrap());
        assert!(matches!(
            table.select("age=1"),
            Err(DatabaseError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_select_returns_copies() {
        let mut table = users();
        let mut selected = table.select("id=1").unwrap();
        selected[0].insert("name".into(), Value::from("Mallory"));
        table.update("id=2", &row([("name", "Robert")])).unwrap();
        assert_eq!(table.row(0).unwrap()["name"], Value::from("Alice"));
    }

    #[test]
    fn test_update_only_matching_rows() {
        let mut table = users();
        let before = table.rows().to_vec();
        let changed = table
            .update("id=1", &row([("is_admin", Value::Bool(true))]))
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(table.row(0).unwrap()["is_admin"], Value::Bool(true));
        assert_eq!(table.rows()[1], before[1]);
        assert_eq!(table.rows()[2], before[2]);
    }

    #[test]
    fn test_update_validates_before_writing() {
        let mut table = users();
        let before = table.clone();

        let err = table
            .update(
                "true",
                &row([("is_admin", Value::Bool(true)), ("name", Value::Int(1))]),
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));
        assert_eq!(table, before);

        let err = table.update("true", &row([("id", Value::Null)])).unwrap_err();
        assert!(matches!(err, DatabaseError::NotNullViolation { .. }));
        assert_eq!(table, before);

        let err = table.update("true", &row([("age", Value::Int(3))])).unwrap_err();
        assert!(matches!(err, DatabaseError::ColumnNotFound { .. }));
        assert_eq!(table, before);
    }

    #[test]
    fn test_update_nullable_column_to_null() {
        let mut table = users();
        table.update("id=2", &row([("name", Value::Null)])).unwrap();
        assert_eq!(table.select("name=NULL").unwrap().len(), 1);
    }

    #[test]
    fn test_update_repairs_index() {
        let mut table = users();
        table.create_index("is_admin").unwrap();
        table
            .update("name='Alice'", &row([("is_admin", Value::Bool(true))]))
            .unwrap();
        assert_eq!(table.lookup("is_admin", &Value::Bool(true)).unwrap(), vec![0, 1]);
        assert_eq!(table.lookup("is_admin", &Value::Bool(false)).unwrap(), vec![2]);
        assert_index_consistent(&table, "is_admin");
    }

    #[test]
    fn test_remove_compacts_and_rebuilds_indices() {
        let mut table = users();
        table.create_index("id").unwrap();

        assert_eq!(table.remove("id=1").unwrap(), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("id", &Value::Int(2)).unwrap(), vec![0]);
        assert_eq!(table.lookup("id", &Value::Int(3)).unwrap(), vec![1]);
        assert!(table.lookup("id", &Value::Int(1)).unwrap().is_empty());
        assert_index_consistent(&table, "id");

        assert_eq!(table.remove("id=42").unwrap(), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut table = users();
        table.remove("id=2").unwrap();
        let names: Vec<Value> = table
            .select("true")
            .unwrap()
            .into_iter()
            .map(|mut r| r.remove("name").unwrap())
            .collect();
        assert_eq!(names, vec![Value::from("Alice"), Value::from("Charlie")]);
    }

    #[test]
    fn test_insert_maintains_index() {
        let mut table = users();
        table.create_index("name").unwrap();
        table
            .insert(row([("id", Value::Int(4)), ("name", Value::from("Bob"))]))
            .unwrap();
        assert_eq!(table.lookup("name", &Value::from("Bob")).unwrap(), vec![1, 3]);
        assert_index_consistent(&table, "name");
    }

    #[test]
    fn test_create_index_unknown_column() {
        let mut table = users();
        assert!(matches!(
            table.create_index("age"),
            Err(DatabaseError::ColumnNotFound { .. })
        ));
        assert_eq!(table.indexed_columns().count(), 0);
    }

    #[test]
    fn test_auto_index_is_idempotent() {
        let mut table = users();
        assert!(table.auto_index("id").unwrap());
        assert!(!table.auto_index("id").unwrap());
        assert_eq!(table.indexed_columns().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_is_unique() {
        let mut table = users();
        assert!(!table.is_unique("id", &Value::Int(2)).unwrap());
        assert!(table.is_unique("id", &Value::Int(9)).unwrap());
        assert!(table.is_unique("id", &Value::Text("2".into())).unwrap());
        assert!(table.is_unique("name", &Value::Null).unwrap());
        assert!(table.is_unique("age", &Value::Int(1)).is_err());

        table.create_index("name").unwrap();
        assert!(!table.is_unique("name", &Value::from("Alice")).unwrap());
        assert!(table.is_unique("name", &Value::from("Zed")).unwrap());
    }

    #[test]
    fn test_from_rows_validates_cells() {
        let schema = Schema::from_pairs([("id", "int32"), ("ok", "bool")]).unwrap();
        let table = Table::from_rows(
            schema.clone(),
            vec![vec![Value::Int(1), Value::Bool(true)], vec![Value::Null, Value::Null]],
        )
        .unwrap();
        assert_eq!(table.len(), 2);

        assert!(Table::from_rows(schema.clone(), vec![vec![Value::Int(1)]]).is_err());
        assert!(matches!(
            Table::from_rows(schema, vec![vec![Value::Bool(true), Value::Bool(true)]]),
            Err(DatabaseError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_free_form_columns_accept_anything() {
        let mut table = Table::new(Schema::from_pairs([("payload", "json")]).unwrap());
        table.insert(row([("payload", Value::Int(1))])).unwrap();
        table.insert(row([("payload", Value::from("x"))])).unwrap();
        assert_eq!(table.select("payload=1").unwrap().len(), 1);
    }
}
