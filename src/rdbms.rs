use crate::acquire::{AcquireChain, SetupStep};
use crate::batch::Batch;
use crate::change::Change;
use crate::connector::{ConnectionSource, Pooled};
use crate::error::SqlStewardError;
use crate::isolation::IsolationLevel;
use crate::query::Query;
use crate::transaction::Transaction;
use crate::types::SqlValue;

/// Entry point: hands out one-shot statements and scoped transactions over a connection source.
///
/// Queries and changes created here take a connection of their own for each execution and run
/// in auto-commit mode. Batches and transactions hold one connection until they are closed.
///
/// ```rust,no_run
/// use sql_steward::prelude::*;
///
/// # async fn demo() -> Result<(), SqlStewardError> {
/// let rdbms = Rdbms::new(SqlitePool::builder("library.db").build().await?);
/// rdbms
///     .change("INSERT INTO books(title) VALUES (?)", &["Clean Code".into()])
///     .apply()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Rdbms<S> {
    source: S,
}

impl<S: ConnectionSource> Rdbms<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// A query that acquires and releases its own connection on every execution.
    #[must_use]
    pub fn query(&self, sql: &str, arguments: &[SqlValue]) -> Query<Pooled<'_, S>> {
        Query::new(Pooled::new(&self.source), sql, arguments)
    }

    /// A change that acquires and releases its own connection on every execution.
    #[must_use]
    pub fn change(&self, sql: &str, arguments: &[SqlValue]) -> Change<Pooled<'_, S>> {
        Change::new(Pooled::new(&self.source), sql, arguments)
    }

    /// A batch owning a freshly acquired connection until it is closed.
    ///
    /// # Errors
    /// Returns `SqlStewardError` if no connection can be acquired or the statement cannot be
    /// prepared; in the latter case the connection is released first.
    pub async fn batch(&self, sql: &str) -> Result<Batch<S::Connection>, SqlStewardError> {
        let conn = self.source.acquire().await?;
        Batch::prepare(conn, sql)
    }

    /// A transaction on a freshly acquired connection in manual-commit mode.
    ///
    /// # Errors
    /// Returns `SqlStewardError` if no connection can be acquired or manual-commit mode cannot be
    /// entered; in the latter case the connection is released first.
    pub async fn transaction(&self) -> Result<Transaction<S::Connection>, SqlStewardError> {
        let chain = self.begin().await?;
        Ok(Transaction::new(chain))
    }

    /// Like [`transaction`](Rdbms::transaction), then applies `isolation`.
    ///
    /// # Errors
    /// As [`transaction`](Rdbms::transaction); if applying the isolation level fails the
    /// connection leaves manual-commit mode and is released before the error is returned.
    pub async fn transaction_with<I>(
        &self,
        isolation: &I,
    ) -> Result<Transaction<S::Connection>, SqlStewardError>
    where
        I: IsolationLevel + ?Sized,
    {
        let mut chain = self.begin().await?;
        chain.apply(SetupStep::Isolation, |conn| isolation.apply_to(conn))?;
        Ok(Transaction::new(chain))
    }

    async fn begin(&self) -> Result<AcquireChain<S::Connection>, SqlStewardError> {
        let mut chain = AcquireChain::new(self.source.acquire().await?);
        chain.apply(SetupStep::ManualCommit, |conn| Ok(conn.execute_batch("BEGIN")?))?;
        tracing::debug!("transaction started");
        Ok(chain)
    }
}
