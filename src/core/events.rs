//! Structured operation events
//!
//! The engine never prints. After each successful operation the
//! [`Database`](super::database::Database) hands one [`DatabaseEvent`] to its
//! [`EventObserver`]. The default observer forwards to `tracing`.

use parking_lot::Mutex;
use std::path::PathBuf;

/// A completed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseEvent {
    /// A table was created (or replaced under the overwrite policy)
    TableCreated { table: String, columns: usize },
    /// One row was inserted at `position`
    RowInserted { table: String, position: usize },
    /// Rows were updated
    RowsUpdated { table: String, rows: usize },
    /// Rows were removed
    RowsRemoved { table: String, rows: usize },
    /// An index was built
    IndexCreated { table: String, column: String },
    /// A transaction began; `depth` is the nesting level after the push
    TransactionBegan { depth: usize },
    /// The innermost transaction was committed
    TransactionCommitted { depth: usize },
    /// The innermost transaction was rolled back
    TransactionRolledBack { depth: usize },
    /// State was written to disk
    Saved { path: PathBuf, tables: usize },
    /// State was read from disk
    Loaded { path: PathBuf, tables: usize },
}

/// Receiver of operation events
pub trait EventObserver: Send + Sync {
    /// Called once per successful operation
    fn on_event(&self, event: &DatabaseEvent);
}

/// Forwards events to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_event(&self, event: &DatabaseEvent) {
        match event {
            DatabaseEvent::TableCreated { table, columns } => {
                tracing::info!(table = %table, columns, "table created")
            }
            DatabaseEvent::RowInserted { table, position } => {
                tracing::debug!(table = %table, position, "row inserted")
            }
            DatabaseEvent::RowsUpdated { table, rows } => {
                tracing::debug!(table = %table, rows, "rows updated")
            }
            DatabaseEvent::RowsRemoved { table, rows } => {
                tracing::debug!(table = %table, rows, "rows removed")
            }
            DatabaseEvent::IndexCreated { table, column } => {
                tracing::info!(table = %table, column = %column, "index created")
            }
            DatabaseEvent::TransactionBegan { depth } => {
                tracing::debug!(depth, "transaction started")
            }
            DatabaseEvent::TransactionCommitted { depth } => {
                tracing::debug!(depth, "transaction committed")
            }
            DatabaseEvent::TransactionRolledBack { depth } => {
                tracing::info!(depth, "transaction rolled back")
            }
            DatabaseEvent::Saved { path, tables } => {
                tracing::info!(path = %path.display(), tables, "database saved")
            }
            DatabaseEvent::Loaded { path, tables } => {
                tracing::info!(path = %path.display(), tables, "database loaded")
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EventObserver for NoopObserver {
    fn on_event(&self, _event: &DatabaseEvent) {}
}

/// Keeps every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<DatabaseEvent>>,
}

impl MemoryObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded events
    pub fn events(&self) -> Vec<DatabaseEvent> {
        self.events.lock().clone()
    }

    /// Take the recorded events, leaving the recorder empty
    pub fn drain(&self) -> Vec<DatabaseEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventObserver for MemoryObserver {
    fn on_event(&self, event: &DatabaseEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_observer_records_in_order() {
        let observer = MemoryObserver::new();
        observer.on_event(&DatabaseEvent::TransactionBegan { depth: 1 });
        observer.on_event(&DatabaseEvent::TransactionCommitted { depth: 0 });

        assert_eq!(
            observer.events(),
            vec![
                DatabaseEvent::TransactionBegan { depth: 1 },
                DatabaseEvent::TransactionCommitted { depth: 0 },
            ]
        );
        assert_eq!(observer.drain().len(), 2);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_tracing_and_noop_observers_accept_every_event() {
        let events = [
            DatabaseEvent::TableCreated { table: "t".into(), columns: 2 },
            DatabaseEvent::RowInserted { table: "t".into(), position: 0 },
            DatabaseEvent::RowsUpdated { table: "t".into(), rows: 1 },
            DatabaseEvent::RowsRemoved { table: "t".into(), rows: 1 },
            DatabaseEvent::IndexCreated { table: "t".into(), column: "id".into() },
            DatabaseEvent::TransactionRolledBack { depth: 0 },
            DatabaseEvent::Saved { path: "db.txt".into(), tables: 1 },
            DatabaseEvent::Loaded { path: "db.txt".into(), tables: 1 },
        ];
        for event in &events {
            TracingObserver.on_event(event);
            NoopObserver.on_event(event);
        }
    }
}
