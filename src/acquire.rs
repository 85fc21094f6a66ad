use std::ops::DerefMut;

use rusqlite::Connection;

use crate::error::SqlStewardError;

/// A setup step applied to a freshly acquired connection, with its undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetupStep {
    /// `BEGIN` issued; undone by rolling back whatever the transaction holds.
    ManualCommit,
    /// An isolation level was applied; undone by restoring the `SQLite` default.
    Isolation,
}

impl SetupStep {
    fn undo(self, conn: &Connection) -> Result<(), SqlStewardError> {
        match self {
            SetupStep::ManualCommit => {
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")?;
                }
                Ok(())
            }
            SetupStep::Isolation => Ok(conn.execute_batch("PRAGMA read_uncommitted = 0")?),
        }
    }
}

/// Re-enter manual-commit mode if the database ended the transaction on its own.
///
/// `SQLite` rolls a transaction back by itself on some failures (an `OR ROLLBACK` conflict clause,
/// `RAISE(ROLLBACK)` in a trigger, a full disk). Returns whether `BEGIN` had to be issued again.
pub(crate) fn resume_manual_commit(conn: &Connection) -> Result<bool, SqlStewardError> {
    if !conn.is_autocommit() {
        return Ok(false);
    }
    tracing::warn!("transaction was ended by the database; starting a new one");
    conn.execute_batch("BEGIN")?;
    Ok(true)
}

/// A connection together with the ordered list of setup steps applied to it so far.
///
/// Releasing the chain undoes the steps newest-first and then drops the connection. A step that
/// fails unwinds everything applied before it, so the caller never ends up holding a
/// half-initialised connection. Releasing twice is a no-op; dropping an unreleased chain releases
/// it.
#[derive(Debug)]
pub(crate) struct AcquireChain<C>
where
    C: DerefMut<Target = Connection>,
{
    conn: Option<C>,
    applied: Vec<SetupStep>,
}

impl<C> AcquireChain<C>
where
    C: DerefMut<Target = Connection>,
{
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn: Some(conn),
            applied: Vec::new(),
        }
    }

    /// Run `setup` and record `step` on success. On failure the chain is released before the
    /// setup error is returned.
    pub(crate) fn apply<F>(&mut self, step: SetupStep, setup: F) -> Result<(), SqlStewardError>
    where
        F: FnOnce(&Connection) -> Result<(), SqlStewardError>,
    {
        let conn = self
            .conn
            .as_deref()
            .ok_or_else(|| SqlStewardError::ConnectionError("connection already released".into()))?;
        match setup(conn) {
            Ok(()) => {
                self.applied.push(step);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(?step, error = %err, "connection setup failed; unwinding");
                if let Err(undo_err) = self.release() {
                    tracing::warn!(error = %undo_err, "unwinding after failed setup was incomplete");
                }
                Err(err)
            }
        }
    }

    pub(crate) fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.conn.as_deref_mut()
    }

    pub(crate) fn connection(&self) -> Option<&Connection> {
        self.conn.as_deref()
    }

    /// Undo applied steps newest-first, then drop the connection.
    ///
    /// Returns `Ok(false)` if the chain was already released. Undo failures do not stop the
    /// release; the first one is returned after the connection has been dropped.
    pub(crate) fn release(&mut self) -> Result<bool, SqlStewardError> {
        let Some(conn) = self.conn.take() else {
            return Ok(false);
        };
        let mut first_err = None;
        while let Some(step) = self.applied.pop() {
            if let Err(err) = step.undo(&conn) {
                tracing::warn!(?step, error = %err, "undo failed during release");
                first_err.get_or_insert(err);
            }
        }
        drop(conn);
        tracing::debug!("connection released");
        first_err.map_or(Ok(true), Err)
    }
}

impl<C> Drop for AcquireChain<C>
where
    C: DerefMut<Target = Connection>,
{
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "releasing dropped connection was incomplete");
        }
    }
}
