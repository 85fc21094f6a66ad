use std::collections::HashMap;
use std::sync::Arc;

use super::row::ResultRow;
use crate::types::SqlValue;

/// Rows of a query, fully read off the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// The rows returned by the query, in cursor order
    pub results: Vec<ResultRow>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty result set for the given columns.
    ///
    /// When a name occurs twice (e.g. `SELECT a.id, b.id`), lookups by name resolve to the first
    /// occurrence; use [`ResultRow::get_by_index`] for the others.
    #[must_use]
    pub fn with_columns(column_names: Vec<String>) -> Self {
        let mut column_index = HashMap::with_capacity(column_names.len());
        for (idx, name) in column_names.iter().enumerate() {
            column_index.entry(name.clone()).or_insert(idx);
        }
        Self {
            results: Vec::new(),
            column_names: Arc::new(column_names),
            column_index: Arc::new(column_index),
        }
    }

    /// Append a row; `values` must follow the column order.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        self.results.push(ResultRow::new(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values,
        ));
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_lookup() {
        let mut rs = ResultSet::with_columns(vec!["id".into(), "title".into(), "id".into()]);
        rs.add_row_values(vec![
            SqlValue::Text("id1".into()),
            SqlValue::Text("Clean Code".into()),
            SqlValue::Int(9),
        ]);

        let row = &rs.results[0];
        assert_eq!(row.get("title").and_then(SqlValue::as_text), Some("Clean Code"));
        assert_eq!(row.get("id").and_then(SqlValue::as_text), Some("id1"));
        assert_eq!(row.get_by_index(2), Some(&SqlValue::Int(9)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(rs.len(), 1);
    }
}
