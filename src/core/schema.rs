//! Table schema: ordered, typed columns with optional NOT NULL constraints
//!
//! Column order is fixed when the schema is built and defines the
//! positional layout of every row.

use serde::{Deserialize, Serialize};

use super::column_type::ColumnType;
use super::error::{DatabaseError, Result};

/// Definition of a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name, unique within the table, case-sensitive
    pub name: String,
    /// Declared type
    pub column_type: ColumnType,
    /// NOT NULL constraint
    pub not_null: bool,
}

impl ColumnDef {
    /// Create a nullable column
    pub fn new<S: Into<String>>(name: S, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
        }
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// Ordered set of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    /// Build a schema, trimming names and rejecting empty or duplicate ones.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(DatabaseError::schema("schema has no columns"));
        }

        let mut cleaned: Vec<ColumnDef> = Vec::with_capacity(columns.len());
        for mut column in columns {
            column.name = column.name.trim().to_string();
            if column.name.is_empty() {
                return Err(DatabaseError::schema("schema contains an empty column name"));
            }
            if let ColumnType::Other(name) = &column.column_type {
                if name.trim().is_empty() {
                    return Err(DatabaseError::schema(format!(
                        "column '{}' has an empty type",
                        column.name
                    )));
                }
            }
            if cleaned.iter().any(|c| c.name == column.name) {
                return Err(DatabaseError::schema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            cleaned.push(column);
        }

        Ok(Self { columns: cleaned })
    }

    /// Build a schema from ordered `(name, type)` string pairs.
    ///
    /// ```
    /// use rust_table_store::{ColumnType, Schema};
    ///
    /// let schema = Schema::from_pairs([("id", "int32"), ("name", "string")]).unwrap();
    /// assert_eq!(schema.column("id").unwrap().column_type, ColumnType::Int32);
    /// ```
    pub fn from_pairs<N, T, I>(pairs: I) -> Result<Self>
    where
        N: AsRef<str>,
        T: AsRef<str>,
        I: IntoIterator<Item = (N, T)>,
    {
        let columns = pairs
            .into_iter()
            .map(|(name, ty)| {
                let column_type = ty.as_ref().parse::<ColumnType>().map_err(|_| {
                    DatabaseError::schema(format!(
                        "column '{}' has an empty type",
                        name.as_ref().trim()
                    ))
                })?;
                Ok(ColumnDef::new(name.as_ref(), column_type))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Columns in positional order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// A valid schema always has at least one column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column definition by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in positional order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Position of a column, or `ColumnNotFound`
    pub(crate) fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| DatabaseError::column_not_found(name))
    }
}
