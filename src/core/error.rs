//! Error types for the table store
//!
//! Every fallible operation aborts as a whole and leaves the prior state
//! untouched; the variant tells the caller which rule was broken.

/// Result type alias for table store operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for table store operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Invalid schema: empty column name or type, duplicate column, empty table name
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A condition, update, index or uniqueness check named an unknown column
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A value's variant disagrees with the column's declared type
    #[error("Type mismatch on column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// Null resolved for a NOT NULL column
    #[error("Column '{column}' cannot be NULL")]
    NotNullViolation { column: String },

    /// Malformed condition, literal or statement text
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table already exists
    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    /// Commit or rollback without a matching begin
    #[error("No active transaction")]
    NoActiveTransaction,

    /// Persisted data could not be written or is corrupted
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DatabaseError {
    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        DatabaseError::SchemaError(msg.into())
    }

    /// Create a column not found error
    pub fn column_not_found<S: Into<String>>(column: S) -> Self {
        DatabaseError::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(column: &str, expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            column: column.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NOT NULL violation error
    pub fn not_null<S: Into<String>>(column: S) -> Self {
        DatabaseError::NotNullViolation {
            column: column.into(),
        }
    }

    /// Create a new syntax error
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        DatabaseError::SyntaxError(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        DatabaseError::PersistenceError(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConfigError(msg.into())
    }
}

impl From<toml::de::Error> for DatabaseError {
    fn from(err: toml::de::Error) -> Self {
        DatabaseError::ConfigError(err.to_string())
    }
}
