use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlStewardError;

use super::pool::SqlitePool;

/// Options for configuring a `SQLite` pool.
///
/// Every connection of the pool opens `db_path`; use a file path; `:memory:` would give each
/// pooled connection a private database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    pub db_path: String,
    /// Upper bound of simultaneously open connections.
    pub max_connections: u32,
    /// How long [`acquire`](crate::ConnectionSource::acquire) waits for a free connection.
    #[serde(with = "millis")]
    pub connection_timeout: Duration,
    /// How long a statement waits on a locked database before failing with `SQLITE_BUSY`.
    #[serde(with = "millis")]
    pub busy_timeout: Duration,
    /// Switch the database to write-ahead logging so readers do not block on a writer.
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            max_connections: 8,
            connection_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    /// Parse options from JSON; missing fields take their defaults.
    ///
    /// ```rust
    /// use sql_steward::SqliteOptions;
    ///
    /// let opts = SqliteOptions::from_json(r#"{"db_path": "library.db", "busy_timeout": 250}"#)?;
    /// assert_eq!(opts.busy_timeout.as_millis(), 250);
    /// assert!(opts.wal);
    /// # Ok::<(), sql_steward::SqlStewardError>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`SqlStewardError::ConfigError`] if the JSON is malformed or `db_path` is empty.
    pub fn from_json(json: &str) -> Result<Self, SqlStewardError> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| SqlStewardError::ConfigError(format!("invalid SQLite options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    pub(crate) fn validate(&self) -> Result<(), SqlStewardError> {
        if self.db_path.is_empty() {
            return Err(SqlStewardError::ConfigError("db_path must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(SqlStewardError::ConfigError(
                "max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.opts.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connection_timeout = timeout;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build the pool.
    ///
    /// # Errors
    ///
    /// Returns `SqlStewardError` if the options are invalid or the initial smoke test fails.
    pub async fn build(self) -> Result<SqlitePool, SqlStewardError> {
        SqlitePool::new(self.finish()).await
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = SqliteOptionsBuilder::new("books.db")
            .max_connections(2)
            .busy_timeout(Duration::from_millis(100))
            .wal(false)
            .finish();
        assert_eq!(opts.db_path, "books.db");
        assert_eq!(opts.max_connections, 2);
        assert_eq!(opts.busy_timeout, Duration::from_millis(100));
        assert_eq!(opts.connection_timeout, Duration::from_secs(30));
        assert!(!opts.wal);
    }

    #[test]
    fn json_round_trip() -> Result<(), SqlStewardError> {
        let opts = SqliteOptionsBuilder::new("books.db")
            .connection_timeout(Duration::from_millis(1500))
            .finish();
        let json = serde_json::to_string(&opts)
            .map_err(|e| SqlStewardError::ConfigError(e.to_string()))?;
        assert!(json.contains(r#""connection_timeout":1500"#));
        assert_eq!(SqliteOptions::from_json(&json)?, opts);
        Ok(())
    }

    #[test]
    fn rejects_missing_path_and_empty_pool() {
        assert!(matches!(
            SqliteOptions::from_json("{}"),
            Err(SqlStewardError::ConfigError(_))
        ));
        assert!(matches!(
            SqliteOptions::from_json(r#"{"db_path": "x.db", "max_connections": 0}"#),
            Err(SqlStewardError::ConfigError(_))
        ));
        assert!(SqliteOptions::from_json("not json").is_err());
    }
}
