use std::collections::HashMap;
use std::ops::DerefMut;

use rusqlite::Connection;

use crate::acquire::{AcquireChain, resume_manual_commit};
use crate::batch::Batch;
use crate::change::Change;
use crate::connector::Borrowed;
use crate::error::SqlStewardError;
use crate::query::Query;
use crate::types::SqlValue;

/// Opaque handle of a savepoint taken inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    quoted: String,
}

impl Savepoint {
    fn create(conn: &Connection, name: &str) -> Result<Self, SqlStewardError> {
        let savepoint = Self {
            quoted: format!("\"{}\"", name.replace('"', "\"\"")),
        };
        conn.execute_batch(&format!("SAVEPOINT {}", savepoint.quoted))?;
        Ok(savepoint)
    }

    fn roll_back(&self, conn: &Connection) -> Result<(), SqlStewardError> {
        conn.execute_batch(&format!("ROLLBACK TO SAVEPOINT {}", self.quoted))?;
        Ok(())
    }
}

/// Statements run on one connection held in manual-commit mode.
///
/// Created by [`Rdbms::transaction`](crate::Rdbms::transaction). Queries, changes and batches
/// created here borrow the transaction's connection and never release it. The transaction stays
/// usable after [`commit`](Transaction::commit) and [`rollback`](Transaction::rollback); only
/// [`close`](Transaction::close) ends it, after which every other operation fails with
/// [`SqlStewardError::TransactionClosed`].
///
/// Savepoint names stay registered until `close`, also across `commit` and `rollback`. The
/// database forgets savepoints when a transaction ends, so rolling back to a name registered
/// before a commit fails in the driver, and the name cannot be registered again.
///
/// If the database ends the transaction on its own (an `OR ROLLBACK` conflict clause, a trigger
/// raising `ROLLBACK`), the next operation starts a new one, so later statements never run in
/// auto-commit mode.
///
/// Dropping an open transaction behaves like `close`: uncommitted work is discarded before the
/// connection is released.
///
/// ```rust,no_run
/// use sql_steward::prelude::*;
///
/// # async fn demo(rdbms: &Rdbms<SqlitePool>) -> Result<(), SqlStewardError> {
/// let mut tx = rdbms.transaction().await?;
/// tx.change("INSERT INTO books(title) VALUES ('Clean Code')", &[])?.apply().await?;
/// tx.set_savepoint("MySavepoint")?;
/// tx.change("INSERT INTO books(title) VALUES ('Code Complete')", &[])?.apply().await?;
/// tx.rollback_to("MySavepoint")?;
/// tx.commit()?;
/// tx.close()?;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Transaction<C>
where
    C: DerefMut<Target = Connection>,
{
    chain: AcquireChain<C>,
    savepoints: HashMap<String, Savepoint>,
}

impl<C> Transaction<C>
where
    C: DerefMut<Target = Connection>,
{
    /// Wrap a chain whose connection is already in manual-commit mode.
    pub(crate) fn new(chain: AcquireChain<C>) -> Self {
        Self {
            chain,
            savepoints: HashMap::new(),
        }
    }

    fn conn(&self) -> Result<&Connection, SqlStewardError> {
        self.chain
            .connection()
            .ok_or(SqlStewardError::TransactionClosed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, SqlStewardError> {
        self.chain
            .connection_mut()
            .ok_or(SqlStewardError::TransactionClosed)
    }

    /// The connection, back inside a transaction if the database had ended it.
    fn active_conn(&self) -> Result<&Connection, SqlStewardError> {
        let conn = self.conn()?;
        resume_manual_commit(conn)?;
        Ok(conn)
    }

    /// A query on this transaction's connection.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::TransactionClosed`] after [`close`](Transaction::close).
    pub fn query(
        &mut self,
        sql: &str,
        arguments: &[SqlValue],
    ) -> Result<Query<Borrowed<'_>>, SqlStewardError> {
        Ok(Query::new(Borrowed::in_transaction(self.conn_mut()?), sql, arguments))
    }

    /// A change on this transaction's connection; it is not committed by `apply`.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::TransactionClosed`] after [`close`](Transaction::close).
    pub fn change(
        &mut self,
        sql: &str,
        arguments: &[SqlValue],
    ) -> Result<Change<Borrowed<'_>>, SqlStewardError> {
        Ok(Change::new(Borrowed::in_transaction(self.conn_mut()?), sql, arguments))
    }

    /// A batch on this transaction's connection. Closing it leaves the connection open.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::TransactionClosed`] after [`close`](Transaction::close), or the
    /// preparation error.
    pub fn batch(&mut self, sql: &str) -> Result<Batch<&mut Connection>, SqlStewardError> {
        Batch::prepare_in_transaction(self.conn_mut()?, sql)
    }

    /// Make everything since the last commit permanent and start over in manual-commit mode.
    ///
    /// If the database already ended the transaction on its own there is nothing left to commit;
    /// a new transaction is started regardless.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::TransactionClosed`] after [`close`](Transaction::close), or the
    /// driver error from `COMMIT`/`BEGIN`. When `BEGIN` fails after a successful `COMMIT`, the next
    /// operation on this transaction issues it again.
    pub fn commit(&mut self) -> Result<(), SqlStewardError> {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            tracing::warn!("commit requested but the database already ended the transaction");
        } else {
            conn.execute_batch("COMMIT")?;
        }
        conn.execute_batch("BEGIN")?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Take a savepoint and register it under `name`.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::SavepointExists`] without touching the database if `name` is
    /// already registered, [`SqlStewardError::TransactionClosed`] after
    /// [`close`](Transaction::close), or the driver error.
    pub fn set_savepoint(&mut self, name: &str) -> Result<(), SqlStewardError> {
        self.conn()?;
        if self.savepoints.contains_key(name) {
            return Err(SqlStewardError::SavepointExists(name.to_owned()));
        }
        let savepoint = Savepoint::create(self.active_conn()?, name)?;
        self.savepoints.insert(name.to_owned(), savepoint);
        tracing::debug!(name, "savepoint set");
        Ok(())
    }

    /// Discard everything since the last commit. Savepoint names stay registered.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::TransactionClosed`] after [`close`](Transaction::close), or the
    /// driver error from `ROLLBACK`/`BEGIN`.
    pub fn rollback(&mut self) -> Result<(), SqlStewardError> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        conn.execute_batch("BEGIN")?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    /// Discard everything done after the savepoint `name` was taken. Earlier work and earlier
    /// savepoints are kept.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::SavepointNotFound`] without touching the database if `name` was
    /// never registered, [`SqlStewardError::TransactionClosed`] after
    /// [`close`](Transaction::close), or the driver error (e.g. when the savepoint was discarded
    /// by an intervening commit).
    pub fn rollback_to(&mut self, name: &str) -> Result<(), SqlStewardError> {
        self.conn()?;
        let savepoint = self
            .savepoints
            .get(name)
            .ok_or_else(|| SqlStewardError::SavepointNotFound(name.to_owned()))?;
        savepoint.roll_back(self.active_conn()?)?;
        tracing::debug!(name, "rolled back to savepoint");
        Ok(())
    }

    /// Registered savepoint names, in no particular order.
    pub fn savepoint_names(&self) -> impl Iterator<Item = &str> {
        self.savepoints.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.chain.connection().is_none()
    }

    /// Discard uncommitted work and release the connection. Calling it again does nothing.
    ///
    /// # Errors
    /// Returns the driver error if discarding uncommitted work failed; the connection is released
    /// regardless.
    pub fn close(&mut self) -> Result<(), SqlStewardError> {
        self.savepoints.clear();
        if self.chain.release()? {
            tracing::debug!("transaction closed");
        }
        Ok(())
    }
}
