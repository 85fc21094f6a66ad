//! Resource-safe statements over pooled `SQLite` connections.
//!
//! [`Rdbms`] hands out one-shot [`Query`]s and [`Change`]s that take and return a connection per
//! execution, [`Batch`]es that run one prepared statement for many argument sets, and
//! [`Transaction`]s with named savepoints. Statements are built from fragments and positional
//! arguments with [`StatementText`]. Every object releases what it acquired, in reverse order,
//! on success and on failure; objects created from a transaction borrow its connection and never
//! release it.
//!
//! ```rust,no_run
//! use sql_steward::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlStewardError> {
//! let rdbms = Rdbms::new(SqlitePool::builder("library.db").build().await?);
//!
//! let mut tx = rdbms.transaction().await?;
//! tx.change("INSERT INTO books(title) VALUES (?)", &["Clean Code".into()])?
//!     .apply()
//!     .await?;
//! tx.commit()?;
//! tx.close()?;
//!
//! let titles = rdbms
//!     .query("SELECT title FROM books", &[])
//!     .execute_with(ColumnToList::new(TextColumn::new("title")))
//!     .await?;
//! assert_eq!(titles, vec!["Clean Code".to_owned()]);
//! # Ok(()) }
//! ```

mod acquire;
pub mod batch;
pub mod change;
pub mod connector;
pub mod error;
pub mod handlers;
pub mod isolation;
pub mod prelude;
pub mod query;
pub mod rdbms;
pub mod results;
pub mod sqlite;
pub mod statement;
pub mod transaction;
pub mod types;

pub use batch::Batch;
pub use change::Change;
pub use connector::{Borrowed, ConnectionSource, Connector, Pooled};
pub use error::{ErrorKind, SqlStewardError};
pub use handlers::ResultHandler;
pub use isolation::{Isolation, IsolationLevel};
pub use query::Query;
pub use rdbms::Rdbms;
pub use results::{ResultRow, ResultSet};
pub use sqlite::{SqliteOptions, SqliteOptionsBuilder, SqlitePool};
pub use statement::StatementText;
pub use transaction::{Savepoint, Transaction};
pub use types::{Bind, SqlValue};
