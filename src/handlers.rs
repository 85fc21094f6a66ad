//! Turning a live cursor into values.
//!
//! A [`ResultHandler`] receives the cursor positioned before the first row and is responsible for
//! advancing it. Any `FnOnce(&mut Rows<'_>) -> Result<R, SqlStewardError>` closure is a handler;
//! the types here cover the common shapes.

use std::marker::PhantomData;

use rusqlite::types::FromSql;
use rusqlite::{Row, Rows};

use crate::error::SqlStewardError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Converts a result cursor into a value of type `R`.
pub trait ResultHandler<R> {
    /// Consume rows from `rows` and build the result.
    ///
    /// # Errors
    /// Returns `SqlStewardError` if reading the cursor or converting a cell fails.
    fn handle(self, rows: &mut Rows<'_>) -> Result<R, SqlStewardError>;
}

impl<R, F> ResultHandler<R> for F
where
    F: FnOnce(&mut Rows<'_>) -> Result<R, SqlStewardError>,
{
    fn handle(self, rows: &mut Rows<'_>) -> Result<R, SqlStewardError> {
        self(rows)
    }
}

/// Extracts one cell of the current row.
pub trait Column<T> {
    /// # Errors
    /// Returns `SqlStewardError` if the column is missing or its value cannot be converted.
    fn cell_value(&self, row: &Row<'_>) -> Result<T, SqlStewardError>;
}

/// A named column read through `rusqlite`'s `FromSql` conversion.
#[derive(Debug, Clone)]
pub struct NamedColumn<T> {
    name: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> NamedColumn<T> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _type: PhantomData,
        }
    }
}

impl<T: FromSql> Column<T> for NamedColumn<T> {
    fn cell_value(&self, row: &Row<'_>) -> Result<T, SqlStewardError> {
        Ok(row.get(self.name.as_str())?)
    }
}

pub type TextColumn = NamedColumn<String>;
pub type IntColumn = NamedColumn<i64>;
pub type FloatColumn = NamedColumn<f64>;
pub type BlobColumn = NamedColumn<Vec<u8>>;

/// A named column read as whatever storage class the cell holds.
#[derive(Debug, Clone)]
pub struct ValueColumn {
    name: String,
}

impl ValueColumn {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Column<SqlValue> for ValueColumn {
    fn cell_value(&self, row: &Row<'_>) -> Result<SqlValue, SqlStewardError> {
        Ok(SqlValue::from_value_ref(row.get_ref(self.name.as_str())?))
    }
}

/// Collects one column of every row into a `Vec`, in cursor order.
#[derive(Debug, Clone)]
pub struct ColumnToList<C> {
    column: C,
}

impl<C> ColumnToList<C> {
    #[must_use]
    pub fn new(column: C) -> Self {
        Self { column }
    }
}

impl<T, C: Column<T>> ResultHandler<Vec<T>> for ColumnToList<C> {
    fn handle(self, rows: &mut Rows<'_>) -> Result<Vec<T>, SqlStewardError> {
        let mut list = Vec::new();
        while let Some(row) = rows.next()? {
            list.push(self.column.cell_value(row)?);
        }
        Ok(list)
    }
}

/// Reads one column of the first row, if there is one; later rows are left unread.
#[derive(Debug, Clone)]
pub struct FirstValue<C> {
    column: C,
}

impl<C> FirstValue<C> {
    #[must_use]
    pub fn new(column: C) -> Self {
        Self { column }
    }
}

impl<T, C: Column<T>> ResultHandler<Option<T>> for FirstValue<C> {
    fn handle(self, rows: &mut Rows<'_>) -> Result<Option<T>, SqlStewardError> {
        match rows.next()? {
            Some(row) => Ok(Some(self.column.cell_value(row)?)),
            None => Ok(None),
        }
    }
}

/// Materialises every row into a [`ResultSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ToResultSet;

impl ResultHandler<ResultSet> for ToResultSet {
    fn handle(self, rows: &mut Rows<'_>) -> Result<ResultSet, SqlStewardError> {
        let column_names: Vec<String> = rows
            .as_ref()
            .map(|stmt| {
                stmt.column_names()
                    .into_iter()
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let column_count = column_names.len();
        let mut result_set = ResultSet::with_columns(column_names);

        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(SqlValue::from_value_ref(row.get_ref(idx)?));
            }
            result_set.add_row_values(values);
        }
        Ok(result_set)
    }
}
