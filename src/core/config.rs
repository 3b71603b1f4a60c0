//! Database configuration
//!
//! Limits applied when loading persisted data and the policy for creating a
//! table under a name that already exists. Can be built in code or read
//! from a TOML document:
//!
//! ```toml
//! max_columns = 1000
//! max_rows = 100000
//! duplicate_tables = "reject"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{DatabaseError, Result};

/// Default upper bound on columns per table
pub const DEFAULT_MAX_COLUMNS: usize = 1000;

/// Default upper bound on rows per loaded table
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// What `create_table` does when the name is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTablePolicy {
    /// Fail with `DuplicateTable`
    #[default]
    Reject,
    /// Replace the existing table with a new empty one
    Overwrite,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Maximum number of columns in a table
    pub max_columns: usize,
    /// Maximum number of rows accepted per table when loading
    pub max_rows: usize,
    /// Policy for `create_table` on an existing name
    pub duplicate_tables: DuplicateTablePolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            max_rows: DEFAULT_MAX_ROWS,
            duplicate_tables: DuplicateTablePolicy::default(),
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum columns per table
    pub fn with_max_columns(mut self, max: usize) -> Self {
        self.max_columns = max;
        self
    }

    /// Set maximum rows per loaded table
    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = max;
        self
    }

    /// Set the duplicate table policy
    pub fn with_duplicate_tables(mut self, policy: DuplicateTablePolicy) -> Self {
        self.duplicate_tables = policy;
        self
    }

    /// Check that the limits are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_columns == 0 {
            return Err(DatabaseError::config("max_columns must be at least 1"));
        }
        if self.max_rows == 0 {
            return Err(DatabaseError::config("max_rows must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DatabaseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
