use crate::connector::Connector;
use crate::error::SqlStewardError;
use crate::statement::StatementText;
use crate::types::SqlValue;

/// A write statement (DML or DDL) returning the number of affected rows.
#[derive(Debug)]
pub struct Change<C> {
    connector: C,
    text: StatementText,
}

impl<C: Connector> Change<C> {
    #[must_use]
    pub fn new(connector: C, sql: &str, arguments: &[SqlValue]) -> Self {
        Self {
            connector,
            text: StatementText::new(sql, arguments),
        }
    }

    #[must_use]
    pub fn append(mut self, fragment: &str, arguments: &[SqlValue]) -> Self {
        self.text.append(fragment, arguments);
        self
    }

    #[must_use]
    pub fn statement(&self) -> &StatementText {
        &self.text
    }

    /// Prepare, bind and execute the statement.
    ///
    /// Outside a transaction the change is committed when this returns; inside one it waits for
    /// [`Transaction::commit`](crate::Transaction::commit).
    ///
    /// # Errors
    /// Returns `SqlStewardError` if acquiring a connection, preparing, binding or executing fails,
    /// including when the statement produces rows.
    pub async fn apply(&mut self) -> Result<usize, SqlStewardError> {
        let text = &self.text;
        self.connector
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(text.rendered_text())?;
                text.bind_into(&mut stmt)?;
                Ok(stmt.raw_execute()?)
            })
            .await
    }
}
