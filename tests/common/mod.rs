#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use rusqlite::Rows;
use sql_steward::prelude::*;
use tempfile::TempDir;
use tracing::Level;

static TRACING: Once = Once::new();

/// Install a test subscriber once; lifecycle events show up with `cargo test -- --nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .try_init();
    });
}

/// A file-backed library database living in its own temp directory.
pub struct LibraryDb {
    _dir: TempDir,
    pub rdbms: Rdbms<SqlitePool>,
}

impl LibraryDb {
    pub fn pool(&self) -> &SqlitePool {
        self.rdbms.source()
    }
}

pub async fn library_db(max_connections: u32) -> Result<LibraryDb, Box<dyn std::error::Error>> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("library.db");
    let pool = SqlitePool::builder(path.to_string_lossy().into_owned())
        .max_connections(max_connections)
        .connection_timeout(Duration::from_secs(2))
        .busy_timeout(Duration::from_secs(2))
        .build()
        .await?;
    let rdbms = Rdbms::new(pool);
    rdbms
        .change(
            "CREATE TABLE books (\
             id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))), \
             title TEXT NOT NULL)",
            &[],
        )
        .apply()
        .await?;
    Ok(LibraryDb { _dir: dir, rdbms })
}

/// All `(id, title)` rows in insertion order, read on a fresh pooled connection.
pub async fn books(rdbms: &Rdbms<SqlitePool>) -> Result<Vec<(String, String)>, SqlStewardError> {
    rdbms
        .query("SELECT id, title FROM books ORDER BY rowid", &[])
        .execute_with(read_books)
        .await
}

pub fn read_books(rows: &mut Rows<'_>) -> Result<Vec<(String, String)>, SqlStewardError> {
    let mut books = Vec::new();
    while let Some(row) = rows.next()? {
        books.push((row.get("id")?, row.get("title")?));
    }
    Ok(books)
}

pub fn titles(books: &[(String, String)]) -> Vec<&str> {
    books.iter().map(|(_, title)| title.as_str()).collect()
}
