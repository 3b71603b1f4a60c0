//! Transaction guard for automatic rollback on drop
//!
//! This module provides RAII-style transaction management over a borrowed
//! [`Database`].

use std::ops::{Deref, DerefMut};

use super::database::Database;
use super::error::{DatabaseError, Result};

/// Transaction guard that rolls back on drop if not committed
///
/// While the guard is alive it is the only handle to the database; all
/// operations go through it via `Deref`/`DerefMut`. The guard owns exactly
/// the level it opened: if that level is finished some other way (for
/// example `tx.commit_transaction()` through `DerefMut`), the guard leaves
/// the outer levels alone.
///
/// # Example
///
/// ```
/// use rust_table_store::{row, Database, Result, Schema, TransactionGuard};
///
/// fn add_user(db: &mut Database) -> Result<()> {
///     let mut tx = TransactionGuard::begin(db)?;
///     tx.insert("users", row([("id", 1)]))?;
///     tx.insert("users", row([("id", 2)]))?;
///     tx.commit()
/// }
///
/// let mut db = Database::new();
/// db.create_table("users", Schema::from_pairs([("id", "int32")])?)?;
/// add_user(&mut db)?;
/// assert_eq!(db.table("users")?.len(), 2);
///
/// // a failing body leaves nothing behind
/// let result = (|| -> Result<()> {
///     let mut tx = TransactionGuard::begin(&mut db)?;
///     tx.insert("users", row([("id", 3)]))?;
///     tx.insert("users", row([("id", "three")]))?;
///     tx.commit()
/// })();
/// assert!(result.is_err());
/// assert_eq!(db.table("users")?.len(), 2);
/// # Ok::<(), rust_table_store::DatabaseError>(())
/// ```
#[derive(Debug)]
pub struct TransactionGuard<'a> {
    db: &'a mut Database,
    depth: usize,
    finished: bool,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a new (possibly nested) transaction
    pub fn begin(db: &'a mut Database) -> Result<Self> {
        db.begin_transaction();
        let depth = db.transaction_depth();
        Ok(Self {
            db,
            depth,
            finished: false,
        })
    }

    /// Stack depth of the level this guard opened
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn owns_level(&self) -> bool {
        self.db.transaction_depth() == self.depth
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` if the guard's level was already finished
    /// through the guard; the outer levels are not touched.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        if !self.owns_level() {
            return Err(DatabaseError::NoActiveTransaction);
        }
        self.db.commit_transaction()
    }

    /// Explicitly roll back the transaction
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` if the guard's level was already finished
    /// through the guard; the outer levels are not touched.
    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        if !self.owns_level() {
            return Err(DatabaseError::NoActiveTransaction);
        }
        self.db.rollback_transaction()
    }
}

impl Deref for TransactionGuard<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        self.db
    }
}

impl DerefMut for TransactionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        self.db
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if !self.owns_level() {
            tracing::warn!(
                guard_depth = self.depth,
                current_depth = self.db.transaction_depth(),
                "transaction guard level already finished, skipping rollback"
            );
            return;
        }
        tracing::debug!("transaction guard dropped without commit, rolling back");
        if let Err(e) = self.db.rollback_transaction() {
            tracing::warn!(error = %e, "transaction guard auto-rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Schema;
    use crate::core::value::row;

    fn test_db() -> Database {
        let mut db = Database::new();
        db.create_table("test", Schema::from_pairs([("id", "int32"), ("value", "string")]).unwrap())
            .unwrap();
        db
    }

    #[test]
    fn test_transaction_guard_commit() {
        let mut db = test_db();
        {
            let mut tx = TransactionGuard::begin(&mut db).unwrap();
            tx.insert("test", row([("value", "test1")])).unwrap();
            tx.commit().unwrap();
        }
        assert_eq!(db.table("test").unwrap().len(), 1);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_transaction_guard_rollback_on_drop() {
        let mut db = test_db();
        {
            let mut tx = TransactionGuard::begin(&mut db).unwrap();
            tx.insert("test", row([("value", "test1")])).unwrap();
        }
        assert_eq!(db.table("test").unwrap().len(), 0);
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_transaction_guard_explicit_rollback() {
        let mut db = test_db();
        {
            let mut tx = TransactionGuard::begin(&mut db).unwrap();
            tx.insert("test", row([("value", "test1")])).unwrap();
            tx.rollback().unwrap();
        }
        assert_eq!(db.table("test").unwrap().len(), 0);
    }

    #[test]
    fn test_nested_guards() {
        let mut db = test_db();
        {
            let mut outer = TransactionGuard::begin(&mut db).unwrap();
            outer.insert("test", row([("id", 1)])).unwrap();
            {
                let mut inner = TransactionGuard::begin(&mut outer).unwrap();
                inner.insert("test", row([("id", 2)])).unwrap();
                assert_eq!(inner.transaction_depth(), 2);
            }
            assert_eq!(outer.table("test").unwrap().len(), 1);
            outer.commit().unwrap();
        }
        assert_eq!(db.table("test").unwrap().len(), 1);
    }

    #[test]
    fn test_guard_leaves_outer_level_when_finished_through_deref() {
        let mut db = test_db();
        db.begin_transaction();
        db.insert("test", row([("id", 1)])).unwrap();
        {
            let mut tx = TransactionGuard::begin(&mut db).unwrap();
            assert_eq!(tx.depth(), 2);
            tx.insert("test", row([("id", 2)])).unwrap();
            tx.commit_transaction().unwrap();
        }
        assert_eq!(db.transaction_depth(), 1);
        assert_eq!(db.table("test").unwrap().len(), 2);

        db.rollback_transaction().unwrap();
        assert_eq!(db.table("test").unwrap().len(), 0);
    }

    #[test]
    fn test_guard_commit_after_level_finished_is_an_error() {
        let mut db = test_db();
        db.begin_transaction();
        {
            let mut tx = TransactionGuard::begin(&mut db).unwrap();
            tx.rollback_transaction().unwrap();
            assert!(matches!(tx.commit(), Err(DatabaseError::NoActiveTransaction)));
        }
        assert_eq!(db.transaction_depth(), 1);
    }
}
