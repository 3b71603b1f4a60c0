//! Database: named tables, snapshot transactions and persistence
//!
//! The database exclusively owns its tables. Transactions are a LIFO stack
//! of full deep copies of the table map: `begin_transaction` pushes a copy,
//! `commit_transaction` discards it and `rollback_transaction` restores it.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use super::condition::Condition;
use super::config::{DatabaseConfig, DuplicateTablePolicy};
use super::error::{DatabaseError, Result};
use super::events::{DatabaseEvent, EventObserver, TracingObserver};
use super::persistence;
use super::schema::Schema;
use super::table::Table;
use super::value::{DatabaseResult, DatabaseRow, Value};

type Tables = BTreeMap<String, Table>;

/// In-memory table store
pub struct Database {
    tables: Tables,
    transaction_stack: Vec<Tables>,
    config: DatabaseConfig,
    observer: Arc<dyn EventObserver>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("transaction_depth", &self.transaction_stack.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self {
            tables: Tables::new(),
            transaction_stack: Vec::new(),
            config: DatabaseConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }
}

impl Database {
    /// Create an empty database with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database with `config`
    ///
    /// # Errors
    ///
    /// `ConfigError` if the configuration does not validate.
    pub fn with_config(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Replace the event observer
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Create an empty table.
    ///
    /// # Errors
    ///
    /// - `SchemaError` if `name` is empty or contains whitespace, or the
    ///   schema has more than `max_columns` columns
    /// - `DuplicateTable` if the name is taken and the policy is
    ///   [`DuplicateTablePolicy::Reject`]
    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<()> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DatabaseError::schema(format!(
                "invalid table name {name:?}: must be non-empty without whitespace"
            )));
        }
        if schema.len() > self.config.max_columns {
            return Err(DatabaseError::schema(format!(
                "table '{name}' has {} columns, limit is {}",
                schema.len(),
                self.config.max_columns
            )));
        }
        if self.tables.contains_key(name)
            && self.config.duplicate_tables == DuplicateTablePolicy::Reject
        {
            return Err(DatabaseError::DuplicateTable(name.to_string()));
        }

        let columns = schema.len();
        self.tables.insert(name.to_string(), Table::new(schema));
        self.emit(DatabaseEvent::TableCreated {
            table: name.to_string(),
            columns,
        });
        Ok(())
    }

    /// Check if a table exists
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table by name
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DatabaseError::TableNotFound(name.to_string()))
    }

    /// Mutable table by name; changes made through it emit no events
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DatabaseError::TableNotFound(name.to_string()))
    }

    /// Table names, sorted
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Insert one row into `table`; see [`Table::insert`]
    pub fn insert(&mut self, table: &str, values: DatabaseRow) -> Result<usize> {
        let position = self.table_mut(table)?.insert(values)?;
        self.emit(DatabaseEvent::RowInserted {
            table: table.to_string(),
            position,
        });
        Ok(position)
    }

    /// Rows of `table` matching `condition`; see [`Table::select`]
    pub fn select(&self, table: &str, condition: &str) -> Result<DatabaseResult> {
        self.table(table)?.select(condition)
    }

    /// [`Database::select`] with an already parsed condition
    pub fn select_where(&self, table: &str, condition: &Condition) -> Result<DatabaseResult> {
        self.table(table)?.select_where(condition)
    }

    /// Update rows of `table`; see [`Table::update`]
    pub fn update(&mut self, table: &str, condition: &str, updates: &DatabaseRow) -> Result<usize> {
        self.update_where(table, &Condition::parse(condition)?, updates)
    }

    /// [`Database::update`] with an already parsed condition
    pub fn update_where(
        &mut self,
        table: &str,
        condition: &Condition,
        updates: &DatabaseRow,
    ) -> Result<usize> {
        let rows = self.table_mut(table)?.update_where(condition, updates)?;
        self.emit(DatabaseEvent::RowsUpdated {
            table: table.to_string(),
            rows,
        });
        Ok(rows)
    }

    /// Remove rows of `table`; see [`Table::remove`]
    pub fn remove(&mut self, table: &str, condition: &str) -> Result<usize> {
        self.remove_where(table, &Condition::parse(condition)?)
    }

    /// [`Database::remove`] with an already parsed condition
    pub fn remove_where(&mut self, table: &str, condition: &Condition) -> Result<usize> {
        let rows = self.table_mut(table)?.remove_where(condition)?;
        self.emit(DatabaseEvent::RowsRemoved {
            table: table.to_string(),
            rows,
        });
        Ok(rows)
    }

    /// Build the index on `table.column`
    pub fn create_index(&mut self, table: &str, column: &str) -> Result<()> {
        self.table_mut(table)?.create_index(column)?;
        self.emit(DatabaseEvent::IndexCreated {
            table: table.to_string(),
            column: column.to_string(),
        });
        Ok(())
    }

    /// Build the index on `table.column` unless it exists
    pub fn auto_index(&mut self, table: &str, column: &str) -> Result<bool> {
        let created = self.table_mut(table)?.auto_index(column)?;
        if created {
            self.emit(DatabaseEvent::IndexCreated {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(created)
    }

    /// See [`Table::is_unique`]
    pub fn is_unique(&self, table: &str, column: &str, value: &Value) -> Result<bool> {
        self.table(table)?.is_unique(column, value)
    }

    /// Push a snapshot of every table
    pub fn begin_transaction(&mut self) {
        self.transaction_stack.push(self.tables.clone());
        self.emit(DatabaseEvent::TransactionBegan {
            depth: self.transaction_stack.len(),
        });
    }

    /// Keep the live state and discard the innermost snapshot
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` when no transaction is open.
    pub fn commit_transaction(&mut self) -> Result<()> {
        self.transaction_stack
            .pop()
            .ok_or(DatabaseError::NoActiveTransaction)?;
        self.emit(DatabaseEvent::TransactionCommitted {
            depth: self.transaction_stack.len(),
        });
        Ok(())
    }

    /// Restore the innermost snapshot
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` when no transaction is open.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        self.tables = self
            .transaction_stack
            .pop()
            .ok_or(DatabaseError::NoActiveTransaction)?;
        self.emit(DatabaseEvent::TransactionRolledBack {
            depth: self.transaction_stack.len(),
        });
        Ok(())
    }

    /// Number of open transactions
    pub fn transaction_depth(&self) -> usize {
        self.transaction_stack.len()
    }

    /// Check if a transaction is open
    pub fn in_transaction(&self) -> bool {
        !self.transaction_stack.is_empty()
    }

    /// Write every table to `path`, replacing the file.
    ///
    /// Nothing is written if any table cannot be represented.
    ///
    /// # Errors
    ///
    /// `PersistenceError` for unrepresentable content or an unwritable path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut buffer = Vec::new();
        self.save_to_writer(&mut buffer)?;
        std::fs::write(path, buffer).map_err(|e| {
            DatabaseError::persistence(format!("cannot write '{}': {e}", path.display()))
        })?;
        self.emit(DatabaseEvent::Saved {
            path: path.to_path_buf(),
            tables: self.tables.len(),
        });
        Ok(())
    }

    /// Write every table to `writer` in name order
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        persistence::write_tables(
            writer,
            self.tables.iter().map(|(name, table)| (name.as_str(), table)),
        )
    }

    /// Read tables from `path`; returns how many were loaded.
    ///
    /// Loaded tables replace live tables of the same name; other tables are
    /// kept. The file is parsed completely first, so a failed load changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// `PersistenceError` if the file cannot be opened or is malformed.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            DatabaseError::persistence(format!("cannot open '{}': {e}", path.display()))
        })?;
        let tables = self.load_from_reader(BufReader::new(file))?;
        self.emit(DatabaseEvent::Loaded {
            path: path.to_path_buf(),
            tables,
        });
        Ok(tables)
    }

    /// Read tables from `reader`; see [`Database::load`]
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let loaded = persistence::read_tables(reader, &self.config).map_err(|e| match e {
            DatabaseError::IoError(io) => DatabaseError::persistence(io.to_string()),
            other => other,
        })?;
        let count = loaded.len();
        self.tables.extend(loaded);
        Ok(count)
    }

    fn emit(&self, event: DatabaseEvent) {
        self.observer.on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::MemoryObserver;
    use crate::core::value::row;
    use std::io::Cursor;

    fn users_schema() -> Schema {
        Schema::from_pairs([("id", "int32"), ("name", "string"), ("is_admin", "bool")]).unwrap()
    }

    fn users_db() -> Database {
        let mut db = Database::new();
        db.create_table("users", users_schema()).unwrap();
        for (id, name, admin) in [(1, "Alice", false), (2, "Bob", true), (3, "Charlie", false)] {
            db.insert(
                "users",
                row([
                    ("id", Value::Int(id)),
                    ("name", Value::from(name)),
                    ("is_admin", Value::Bool(admin)),
                ]),
            )
            .unwrap();
        }
        db
    }

    #[test]
    fn test_create_table_rejects_duplicates_by_default() {
        let mut db = users_db();
        let err = db.create_table("users", users_schema()).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateTable(ref name) if name == "users"));
        assert_eq!(db.table("users").unwrap().len(), 3);
    }

    #[test]
    fn test_create_table_overwrite_policy() {
        let config = DatabaseConfig::new().with_duplicate_tables(DuplicateTablePolicy::Overwrite);
        let mut db = Database::with_config(config).unwrap();
        db.create_table("t", users_schema()).unwrap();
        db.insert("t", row([("id", 1)])).unwrap();

        db.create_table("t", Schema::from_pairs([("x", "bool")]).unwrap())
            .unwrap();
        let table = db.table("t").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.schema().names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_create_table_validates_name_and_width() {
        let mut db = Database::with_config(DatabaseConfig::new().with_max_columns(2)).unwrap();
        assert!(matches!(
            db.create_table("", users_schema()),
            Err(DatabaseError::SchemaError(_))
        ));
        assert!(matches!(
            db.create_table("my table", users_schema()),
            Err(DatabaseError::SchemaError(_))
        ));
        assert!(matches!(
            db.create_table("wide", users_schema()),
            Err(DatabaseError::SchemaError(_))
        ));
        assert_eq!(db.table_count(), 0);
    }

    #[test]
    fn test_with_config_validates() {
        assert!(matches!(
            Database::with_config(DatabaseConfig::new().with_max_rows(0)),
            Err(DatabaseError::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_table() {
        let mut db = Database::new();
        assert!(matches!(db.select("ghost", "true"), Err(DatabaseError::TableNotFound(_))));
        assert!(matches!(
            db.insert("ghost", row([("id", 1)])),
            Err(DatabaseError::TableNotFound(_))
        ));
        assert!(matches!(
            db.create_index("ghost", "id"),
            Err(DatabaseError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_crud_through_database() {
        let mut db = users_db();
        let admins = db.select("users", "is_admin=true").unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0]["name"], Value::from("Bob"));

        assert_eq!(db.remove("users", "id=3").unwrap(), 1);
        assert_eq!(db.table("users").unwrap().len(), 2);

        assert_eq!(
            db.update("users", "id=1", &row([("is_admin", true)])).unwrap(),
            1
        );
        assert_eq!(db.select("users", "is_admin=true").unwrap().len(), 2);
        assert!(!db.is_unique("users", "id", &Value::Int(1)).unwrap());
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut db = users_db();
        db.create_index("users", "id").unwrap();
        let before = db.table("users").unwrap().clone();

        db.begin_transaction();
        db.insert("users", row([("id", 4)])).unwrap();
        db.remove("users", "id=1").unwrap();
        db.create_table("extra", users_schema()).unwrap();
        db.rollback_transaction().unwrap();

        assert_eq!(db.table("users").unwrap(), &before);
        assert!(!db.has_table("extra"));
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_commit_keeps_changes_and_pops_one_level() {
        let mut db = users_db();
        db.begin_transaction();
        db.begin_transaction();
        db.insert("users", row([("id", 4)])).unwrap();
        db.commit_transaction().unwrap();
        assert_eq!(db.transaction_depth(), 1);
        assert_eq!(db.table("users").unwrap().len(), 4);

        // the outer snapshot predates the insert
        db.rollback_transaction().unwrap();
        assert_eq!(db.table("users").unwrap().len(), 3);
    }

    #[test]
    fn test_commit_and_rollback_without_transaction() {
        let mut db = users_db();
        assert!(matches!(db.commit_transaction(), Err(DatabaseError::NoActiveTransaction)));
        assert!(matches!(db.rollback_transaction(), Err(DatabaseError::NoActiveTransaction)));
        assert_eq!(db.table("users").unwrap().len(), 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let db = users_db();
        let mut buffer = Vec::new();
        db.save_to_writer(&mut buffer).unwrap();

        let mut fresh = Database::new();
        assert_eq!(fresh.load_from_reader(Cursor::new(buffer)).unwrap(), 1);
        let loaded = fresh.table("users").unwrap();
        let original = db.table("users").unwrap();
        assert_eq!(loaded.rows(), original.rows());
        assert_eq!(loaded.schema(), original.schema());
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let mut db = users_db();
        let err = db
            .load_from_reader(Cursor::new("users\n1\nid int32\n1\nint 9\nbroken\nx\n"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::PersistenceError(_)));
        assert_eq!(db.table("users").unwrap().len(), 3);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_to_failing_writer() {
        let db = users_db();
        assert!(matches!(
            db.save_to_writer(&mut FullDisk),
            Err(DatabaseError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_load_rejects_table_name_with_whitespace() {
        let mut db = users_db();
        let err = db
            .load_from_reader(Cursor::new("my table\n1\nid int32\n0\n"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::PersistenceError(_)));
        assert_eq!(db.table_names().count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new();
        assert!(matches!(
            db.load(dir.path().join("missing.db")),
            Err(DatabaseError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_events_are_emitted() {
        let observer = Arc::new(MemoryObserver::new());
        let mut db = Database::new().with_observer(observer.clone());
        db.create_table("t", Schema::from_pairs([("id", "int32")]).unwrap())
            .unwrap();
        db.begin_transaction();
        db.insert("t", row([("id", 1)])).unwrap();
        db.remove("t", "id=1").unwrap();
        db.commit_transaction().unwrap();
        // failed operations emit nothing
        let _ = db.insert("t", row([("id", "x")]));

        assert_eq!(
            observer.events(),
            vec![
                DatabaseEvent::TableCreated { table: "t".into(), columns: 1 },
                DatabaseEvent::TransactionBegan { depth: 1 },
                DatabaseEvent::RowInserted { table: "t".into(), position: 0 },
                DatabaseEvent::RowsRemoved { table: "t".into(), rows: 1 },
                DatabaseEvent::TransactionCommitted { depth: 0 },
            ]
        );
    }
}
