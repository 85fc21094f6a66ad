use chrono::NaiveDateTime;
use rusqlite::Statement;
use rusqlite::types::{Value, ValueRef};
use serde_json::Value as JsonValue;

use crate::error::SqlStewardError;

/// Values bound as statement arguments or read back out of result rows.
///
/// The same enum serves both directions so helpers never need to branch on driver types:
/// ```rust
/// use sql_steward::prelude::*;
///
/// let args = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, stored as 0/1
    Bool(bool),
    /// Timestamp value, stored as `YYYY-MM-DD HH:MM:SS[.fff]` text
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, stored as text
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

/// Capability of placing a value at a 1-based parameter position of a prepared statement.
pub trait Bind {
    /// Bind `self` at `position` (1-based).
    ///
    /// # Errors
    /// Returns [`SqlStewardError::ParameterError`] if the driver refuses the value or the position
    /// has no parameter marker.
    fn bind(&self, statement: &mut Statement<'_>, position: usize) -> Result<(), SqlStewardError>;
}

impl Bind for SqlValue {
    fn bind(&self, statement: &mut Statement<'_>, position: usize) -> Result<(), SqlStewardError> {
        statement
            .raw_bind_parameter(position, self.to_sqlite_value())
            .map_err(|source| SqlStewardError::ParameterError { position, source })
    }
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Convert into the driver's owned value type.
    #[must_use]
    pub fn to_sqlite_value(&self) -> Value {
        match self {
            SqlValue::Int(i) => Value::Integer(*i),
            SqlValue::Float(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
            SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
            SqlValue::Null => Value::Null,
            SqlValue::Json(json) => Value::Text(json.to_string()),
            SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        }
    }

    /// Read a cell as stored by `SQLite`. Storage classes map one-to-one; no type affinity is
    /// guessed, so booleans come back as `Int` and timestamps as `Text`.
    #[must_use]
    pub fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Int(i),
            ValueRef::Real(f) => SqlValue::Float(f),
            ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamps_round_trip_through_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 30))
            .expect("valid date");
        let stored = SqlValue::Timestamp(dt).to_sqlite_value();
        assert_eq!(stored, Value::Text("2024-03-09 14:05:30".into()));
        assert_eq!(SqlValue::Text("2024-03-09 14:05:30".into()).as_timestamp(), Some(dt));
    }

    #[test]
    fn booleans_and_json_are_stored_natively() {
        assert_eq!(SqlValue::Bool(true).to_sqlite_value(), Value::Integer(1));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(
            SqlValue::Json(serde_json::json!({"a": 1})).to_sqlite_value(),
            Value::Text(r#"{"a":1}"#.into())
        );
    }

    #[test]
    fn options_map_to_null() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }

    #[test]
    fn binding_out_of_range_is_a_parameter_error() {
        let conn = rusqlite::Connection::open_in_memory().expect("in-memory db");
        let mut stmt = conn.prepare("SELECT ?").expect("prepare");
        let err = SqlValue::Int(1).bind(&mut stmt, 2).expect_err("no marker at 2");
        assert!(matches!(err, SqlStewardError::ParameterError { position: 2, .. }));
    }
}
