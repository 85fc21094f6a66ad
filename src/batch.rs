use std::ops::DerefMut;

use rusqlite::Connection;

use crate::acquire::resume_manual_commit;
use crate::error::SqlStewardError;
use crate::statement::bind_all;
use crate::types::SqlValue;

/// One prepared statement executed once per queued argument set.
///
/// The compiled statement lives in the connection's statement cache; the batch keeps the
/// queue of argument sets. `C` decides ownership: a batch from
/// [`Rdbms::batch`](crate::Rdbms::batch) owns its pooled connection and releases it on
/// [`close`](Batch::close), a batch from [`Transaction::batch`](crate::Transaction::batch) only
/// borrows the transaction's connection.
///
/// Dropping an unclosed batch closes it.
#[derive(Debug)]
pub struct Batch<C>
where
    C: DerefMut<Target = Connection>,
{
    conn: Option<C>,
    sql: String,
    parameter_count: usize,
    queued: Vec<Vec<SqlValue>>,
    in_transaction: bool,
}

impl<C> Batch<C>
where
    C: DerefMut<Target = Connection>,
{
    /// Prepare `sql` on `conn`. If preparation fails `conn` is released before the error is
    /// returned.
    ///
    /// # Errors
    /// Returns `SqlStewardError` if the statement cannot be prepared.
    pub fn prepare(conn: C, sql: &str) -> Result<Self, SqlStewardError> {
        Self::prepare_with(conn, sql, false)
    }

    /// Prepare `sql` on a transaction's connection. Every `apply` first makes sure the connection
    /// is still inside a transaction.
    pub(crate) fn prepare_in_transaction(conn: C, sql: &str) -> Result<Self, SqlStewardError> {
        Self::prepare_with(conn, sql, true)
    }

    fn prepare_with(conn: C, sql: &str, in_transaction: bool) -> Result<Self, SqlStewardError> {
        let prepared = conn
            .prepare_cached(sql)
            .map(|stmt| stmt.parameter_count());
        match prepared {
            Ok(parameter_count) => Ok(Self {
                conn: Some(conn),
                sql: sql.to_owned(),
                parameter_count,
                queued: Vec::new(),
                in_transaction,
            }),
            Err(err) => {
                drop(conn);
                tracing::debug!(error = %err, "batch prepare failed; connection released");
                Err(err.into())
            }
        }
    }

    /// Queue one operation. `arguments` bind at positions `1..=arguments.len()` and must match
    /// the statement's parameter markers exactly.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::BatchClosed`] after [`close`](Batch::close), or a binding error
    /// when the argument count does not match the markers.
    pub fn put(&mut self, arguments: &[SqlValue]) -> Result<(), SqlStewardError> {
        if self.conn.is_none() {
            return Err(SqlStewardError::BatchClosed);
        }
        if arguments.len() != self.parameter_count {
            return Err(
                rusqlite::Error::InvalidParameterCount(arguments.len(), self.parameter_count)
                    .into(),
            );
        }
        self.queued.push(arguments.to_vec());
        Ok(())
    }

    /// Number of operations waiting for [`apply`](Batch::apply).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queued.len()
    }

    /// Execute every queued operation in put order and return their affected-row counts.
    ///
    /// The queue is empty afterwards. The first failing operation stops the batch; operations
    /// before it have already run and are not undone here.
    ///
    /// # Errors
    /// Returns [`SqlStewardError::BatchClosed`] after [`close`](Batch::close), or
    /// [`SqlStewardError::BatchError`] naming the failing operation and the counts of those that
    /// completed.
    pub fn apply(&mut self) -> Result<Vec<usize>, SqlStewardError> {
        let conn = self.conn.as_deref().ok_or(SqlStewardError::BatchClosed)?;
        if self.in_transaction {
            resume_manual_commit(conn)?;
        }
        let queued = std::mem::take(&mut self.queued);
        let mut completed = Vec::with_capacity(queued.len());

        for (index, arguments) in queued.iter().enumerate() {
            let outcome = conn
                .prepare_cached(&self.sql)
                .map_err(SqlStewardError::from)
                .and_then(|mut stmt| {
                    bind_all(&mut stmt, arguments)?;
                    Ok(stmt.raw_execute()?)
                });
            match outcome {
                Ok(count) => completed.push(count),
                Err(source) => {
                    tracing::debug!(index, error = %source, "batch operation failed");
                    return Err(SqlStewardError::BatchError {
                        index,
                        completed,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(completed)
    }

    /// Release the statement and, when the batch owns it, the connection. Safe to call again.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.queued.clear();
            conn.flush_prepared_statement_cache();
            drop(conn);
            tracing::debug!(sql = %self.sql, "batch closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl<C> Drop for Batch<C>
where
    C: DerefMut<Target = Connection>,
{
    fn drop(&mut self) {
        self.close();
    }
}
