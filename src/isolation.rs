use rusqlite::Connection;

use crate::error::SqlStewardError;

/// Applies a transaction isolation level to a connection.
///
/// Applied after the connection has entered manual-commit mode. Whatever the level changes is
/// reset to the `SQLite` default when the transaction releases its connection.
pub trait IsolationLevel: Send + Sync {
    /// # Errors
    /// Returns `SqlStewardError` if the connection refuses the level.
    fn apply_to(&self, conn: &Connection) -> Result<(), SqlStewardError>;
}

/// The standard isolation levels.
///
/// `SQLite` transactions are serializable; the only knob is `read_uncommitted`, which lets a
/// connection in shared-cache mode read rows other connections have not committed yet. Every
/// other level therefore maps to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isolation {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel for Isolation {
    fn apply_to(&self, conn: &Connection) -> Result<(), SqlStewardError> {
        let sql = match self {
            Isolation::ReadUncommitted => "PRAGMA read_uncommitted = 1",
            Isolation::ReadCommitted | Isolation::RepeatableRead | Isolation::Serializable => {
                "PRAGMA read_uncommitted = 0"
            }
        };
        conn.execute_batch(sql)?;
        Ok(())
    }
}
