use std::future::Future;
use std::ops::DerefMut;

use async_trait::async_trait;
use rusqlite::Connection;

use crate::acquire::resume_manual_commit;
use crate::error::SqlStewardError;

/// Something that hands out database connections, e.g. a pool.
///
/// Dropping the returned connection releases it back to wherever it came from.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    type Connection: DerefMut<Target = Connection> + Send + 'static;

    /// Obtain a connection.
    ///
    /// # Errors
    /// Returns an acquisition error ([`SqlStewardError::ConnectionError`]) if no connection can be
    /// obtained.
    async fn acquire(&self) -> Result<Self::Connection, SqlStewardError>;
}

/// How a query or change gets hold of the connection it runs on.
///
/// The two implementations encode ownership: [`Pooled`] acquires and releases a connection of its
/// own for every execution, [`Borrowed`] runs on a connection someone else owns and never releases
/// it.
pub trait Connector: Send {
    /// Run `work` against a connection, releasing it afterwards if this connector acquired it.
    fn with_connection<R, F>(
        &mut self,
        work: F,
    ) -> impl Future<Output = Result<R, SqlStewardError>> + Send
    where
        F: FnOnce(&mut Connection) -> Result<R, SqlStewardError> + Send,
        R: Send;
}

/// Acquires a fresh connection from `S` per execution.
#[derive(Debug)]
pub struct Pooled<'s, S> {
    source: &'s S,
}

impl<'s, S: ConnectionSource> Pooled<'s, S> {
    #[must_use]
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }
}

impl<S: ConnectionSource> Connector for Pooled<'_, S> {
    fn with_connection<R, F>(
        &mut self,
        work: F,
    ) -> impl Future<Output = Result<R, SqlStewardError>> + Send
    where
        F: FnOnce(&mut Connection) -> Result<R, SqlStewardError> + Send,
        R: Send,
    {
        let source = self.source;
        async move {
            let mut conn = source.acquire().await?;
            tracing::debug!("connection acquired for one-shot statement");
            let outcome = work(&mut *conn);
            drop(conn);
            tracing::debug!(ok = outcome.is_ok(), "one-shot connection released");
            outcome
        }
    }
}

/// Runs on a connection owned elsewhere (usually a [`Transaction`](crate::Transaction)).
#[derive(Debug)]
pub struct Borrowed<'c> {
    conn: &'c mut Connection,
    manual_commit: bool,
}

impl<'c> Borrowed<'c> {
    #[must_use]
    pub fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            manual_commit: false,
        }
    }

    /// Borrow a transaction's connection; every execution first makes sure it is still inside
    /// a transaction.
    pub(crate) fn in_transaction(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            manual_commit: true,
        }
    }
}

impl Connector for Borrowed<'_> {
    fn with_connection<R, F>(
        &mut self,
        work: F,
    ) -> impl Future<Output = Result<R, SqlStewardError>> + Send
    where
        F: FnOnce(&mut Connection) -> Result<R, SqlStewardError> + Send,
        R: Send,
    {
        let conn = &mut *self.conn;
        let manual_commit = self.manual_commit;
        async move {
            if manual_commit {
                resume_manual_commit(conn)?;
            }
            work(conn)
        }
    }
}
