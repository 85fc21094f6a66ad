use crate::connector::Connector;
use crate::error::SqlStewardError;
use crate::handlers::ResultHandler;
use crate::statement::StatementText;
use crate::types::SqlValue;

/// A read statement: prepared, bound and executed anew on every [`execute_with`](Query::execute_with).
///
/// Obtained from [`Rdbms::query`](crate::Rdbms::query) (runs on its own pooled connection) or
/// [`Transaction::query`](crate::Transaction::query) (runs on the transaction's connection).
///
/// ```rust,no_run
/// use sql_steward::prelude::*;
///
/// # async fn demo(rdbms: &Rdbms<SqlitePool>) -> Result<(), SqlStewardError> {
/// let titles = rdbms
///     .query("SELECT title FROM books ", &[])
///     .append("WHERE title LIKE ? ", &["Clean%".into()])
///     .append("LIMIT ?", &[10.into()])
///     .execute_with(ColumnToList::new(TextColumn::new("title")))
///     .await?;
/// # let _ = titles;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Query<C> {
    connector: C,
    text: StatementText,
}

impl<C: Connector> Query<C> {
    #[must_use]
    pub fn new(connector: C, sql: &str, arguments: &[SqlValue]) -> Self {
        Self {
            connector,
            text: StatementText::new(sql, arguments),
        }
    }

    /// Append a fragment and its arguments. Appending after an execution only affects later
    /// executions.
    #[must_use]
    pub fn append(mut self, fragment: &str, arguments: &[SqlValue]) -> Self {
        self.text.append(fragment, arguments);
        self
    }

    #[must_use]
    pub fn statement(&self) -> &StatementText {
        &self.text
    }

    /// Prepare, bind and run the statement, then hand the cursor to `handler`.
    ///
    /// The cursor, the statement and (for pooled queries) the connection are released, in that
    /// order, before this returns, whether or not it succeeds.
    ///
    /// # Errors
    /// Returns `SqlStewardError` if acquiring a connection, preparing, binding, executing or the
    /// handler fails. No partial result is returned.
    pub async fn execute_with<R, H>(&mut self, handler: H) -> Result<R, SqlStewardError>
    where
        H: ResultHandler<R> + Send,
        R: Send,
    {
        let text = &self.text;
        self.connector
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(text.rendered_text())?;
                text.bind_into(&mut stmt)?;
                let mut rows = stmt.raw_query();
                handler.handle(&mut rows)
            })
            .await
    }
}
