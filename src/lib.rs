//! # Rust Table Store
//!
//! A small embedded relational table store: typed columns, a boolean
//! condition language, single-column indices, nested snapshot transactions
//! and a whitespace-tokenised text file format.
//!
//! ## Features
//!
//! - **Typed values**: `int32`, `string` and `bool` columns checked on every write
//! - **Atomic operations**: a failed insert, update or remove changes nothing
//! - **Conditions**: `col=literal` comparisons joined by `AND`, `OR` and `NOT`
//! - **Indices**: value to row-position lookup kept in step with every mutation
//! - **Transactions**: LIFO stack of full snapshots with commit and rollback
//! - **Persistence**: save to and load from a plain text file
//! - **Observability**: structured events through `tracing` or a custom observer
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_table_store::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = Database::new();
//!     db.create_table(
//!         "users",
//!         Schema::from_pairs([("id", "int32"), ("name", "string"), ("is_admin", "bool")])?,
//!     )?;
//!
//!     db.insert("users", row([("id", Value::Int(1)), ("name", "Alice".into()), ("is_admin", false.into())]))?;
//!     db.insert("users", row([("id", Value::Int(2)), ("name", "Bob".into()), ("is_admin", true.into())]))?;
//!
//!     let admins = db.select("users", "is_admin=true")?;
//!     assert_eq!(admins.len(), 1);
//!     assert_eq!(admins[0]["name"], Value::from("Bob"));
//!     Ok(())
//! }
//! ```
//!
//! ### Working with Transactions
//!
//! ```rust
//! use rust_table_store::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = Database::new();
//!     db.create_table("accounts", Schema::from_pairs([("id", "int32"), ("balance", "int32")])?)?;
//!     db.insert("accounts", row([("id", 1), ("balance", 100)]))?;
//!
//!     db.begin_transaction();
//!     db.update("accounts", "id=1", &row([("balance", 0)]))?;
//!     db.rollback_transaction()?;
//!
//!     assert_eq!(db.select("accounts", "balance=100")?.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ### Statements
//!
//! ```rust
//! use rust_table_store::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut db = Database::new();
//!     db.execute("CREATE TABLE users (id:int32 NOT NULL,name:string)")?;
//!     db.execute("INSERT TO users (id=1,name='Alice')")?;
//!     println!("{}", db.execute("SELECT * FROM users WHERE id=1")?);
//!     Ok(())
//! }
//! ```

/// Core table store types
pub mod core;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_table_store::prelude::*;
///
/// let mut db = Database::new();
/// assert!(!db.in_transaction());
/// db.begin_transaction();
/// assert!(db.commit_transaction().is_ok());
/// ```
pub mod prelude {
    pub use crate::core::{
        row, ColumnDef, ColumnType, Condition, Database, DatabaseConfig, DatabaseError,
        DatabaseResult, DatabaseRow, ExecOutcome, Result, Schema, Table, TransactionGuard, Value,
    };
}

// Re-export at root level for convenience
pub use crate::core::{
    parse_literal, row, ColumnDef, ColumnType, Condition, Database, DatabaseConfig, DatabaseError,
    DatabaseEvent, DatabaseResult, DatabaseRow, DuplicateTablePolicy, EventObserver, ExecOutcome,
    Index, MemoryObserver, NoopObserver, Result, RowView, Schema, Statement, Table,
    TracingObserver, TransactionGuard, Value, MAX_CONDITION_DEPTH,
};
