//! SQLite connection source: pool options and the bb8-backed pool.

pub mod config;
pub mod pool;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use pool::{SqliteManager, SqlitePool};
