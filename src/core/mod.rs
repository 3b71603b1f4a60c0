//! Core table store types
//!
//! This module provides the building blocks of the store: values and
//! schemas, the condition language, tables with their indices, the database
//! with its transactions and persistence, and the statement front end.

pub mod column_type;
pub mod command;
pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod index;
pub mod persistence;
pub mod schema;
pub mod table;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use column_type::ColumnType;
pub use command::{ExecOutcome, Statement};
pub use condition::{parse_literal, Condition, RowView, MAX_CONDITION_DEPTH};
pub use config::{DatabaseConfig, DuplicateTablePolicy};
pub use database::Database;
pub use error::{DatabaseError, Result};
pub use events::{DatabaseEvent, EventObserver, MemoryObserver, NoopObserver, TracingObserver};
pub use index::Index;
pub use schema::{ColumnDef, Schema};
pub use table::Table;
pub use transaction::TransactionGuard;
pub use value::{row, DatabaseResult, DatabaseRow, Value};
