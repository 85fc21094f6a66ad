use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bb8::{ManageConnection, Pool, PooledConnection};
use rusqlite::Connection;

use crate::connector::ConnectionSource;
use crate::error::SqlStewardError;

use super::config::{SqliteOptions, SqliteOptionsBuilder};

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
    busy_timeout: Duration,
    wal: bool,
}

impl SqliteManager {
    #[must_use]
    pub fn new(opts: &SqliteOptions) -> Self {
        Self {
            db_path: opts.db_path.clone(),
            busy_timeout: opts.busy_timeout,
            wal: opts.wal,
        }
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        if self.wal {
            // journal_mode reports the resulting mode as a row
            let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        }
        Ok(conn)
    }
}

impl ManageConnection for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let manager = self.clone();
        async move { manager.open() }
    }

    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.query_row("SELECT 1", [], |_| Ok(())) }
    }

    /// A connection handed back while still inside a transaction is never reused.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        let broken = !conn.is_autocommit();
        if broken {
            tracing::warn!("connection returned to pool inside an open transaction; discarding");
        }
        broken
    }
}

/// Pool of `SQLite` connections; the [`ConnectionSource`] behind [`Rdbms`](crate::Rdbms).
#[derive(Debug, Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteManager>,
    options: SqliteOptions,
}

impl SqlitePool {
    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Build the pool and check out one connection as a smoke test.
    ///
    /// # Errors
    /// Returns `SqlStewardError::ConfigError` for invalid options and
    /// `SqlStewardError::ConnectionError` if pool creation or the first connection fails.
    pub async fn new(options: SqliteOptions) -> Result<Self, SqlStewardError> {
        options.validate()?;
        let pool = Pool::builder()
            .max_size(options.max_connections)
            .connection_timeout(options.connection_timeout)
            .build(SqliteManager::new(&options))
            .await
            .map_err(|e| {
                SqlStewardError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
            })?;

        {
            let conn = pool.get().await?;
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
        }
        tracing::debug!(db_path = %options.db_path, max = options.max_connections, "sqlite pool ready");

        Ok(Self { pool, options })
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }

    /// Snapshot of open and idle connection counts.
    #[must_use]
    pub fn state(&self) -> bb8::State {
        self.pool.state()
    }
}

#[async_trait]
impl ConnectionSource for SqlitePool {
    type Connection = PooledConnection<'static, SqliteManager>;

    async fn acquire(&self) -> Result<Self::Connection, SqlStewardError> {
        self.pool.get_owned().await.map_err(|e| {
            SqlStewardError::ConnectionError(format!("sqlite checkout error: {e}"))
        })
    }
}
