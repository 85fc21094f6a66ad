//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::batch::Batch;
pub use crate::change::Change;
pub use crate::connector::{Borrowed, ConnectionSource, Connector, Pooled};
pub use crate::error::{ErrorKind, SqlStewardError};
pub use crate::handlers::{
    BlobColumn, Column, ColumnToList, FirstValue, FloatColumn, IntColumn, NamedColumn,
    ResultHandler, TextColumn, ToResultSet, ValueColumn,
};
pub use crate::isolation::{Isolation, IsolationLevel};
pub use crate::query::Query;
pub use crate::rdbms::Rdbms;
pub use crate::results::{ResultRow, ResultSet};
pub use crate::sqlite::{SqliteOptions, SqliteOptionsBuilder, SqlitePool};
pub use crate::statement::StatementText;
pub use crate::transaction::{Savepoint, Transaction};
pub use crate::types::{Bind, SqlValue};
