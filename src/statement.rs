use rusqlite::Statement;

use crate::error::SqlStewardError;
use crate::types::{Bind, SqlValue};

/// Parameterized SQL built up from fragments.
///
/// The Nth argument always binds to position N of the prepared statement, in the order the
/// fragments carrying them were appended. Fragments and arguments are only ever added, never
/// removed or reordered. No SQL is parsed here: a marker/argument mismatch is reported by the
/// driver when the text is bound.
///
/// ```rust
/// use sql_steward::prelude::*;
///
/// let mut text = StatementText::new("SELECT title FROM books ", &[]);
/// text.append("WHERE title LIKE ? ", &["Clean%".into()]);
/// text.append("LIMIT ?", &[10.into()]);
/// assert_eq!(text.rendered_text(), "SELECT title FROM books WHERE title LIKE ? LIMIT ?");
/// assert_eq!(text.arguments().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementText {
    text: String,
    arguments: Vec<SqlValue>,
}

impl StatementText {
    #[must_use]
    pub fn new(fragment: &str, arguments: &[SqlValue]) -> Self {
        Self {
            text: fragment.to_owned(),
            arguments: arguments.to_vec(),
        }
    }

    /// Concatenate `fragment` and extend the argument list with `arguments`, in call order.
    pub fn append(&mut self, fragment: &str, arguments: &[SqlValue]) {
        self.text.push_str(fragment);
        self.arguments.extend_from_slice(arguments);
    }

    /// The accumulated SQL, verbatim.
    #[must_use]
    pub fn rendered_text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn arguments(&self) -> &[SqlValue] {
        &self.arguments
    }

    /// Bind every argument at its 1-based position, stopping at the first failure.
    ///
    /// # Errors
    /// Returns `rusqlite::Error::InvalidParameterCount` (wrapped) when the statement has a
    /// different number of markers than there are arguments, or the binding error of the first
    /// argument the driver refuses.
    pub fn bind_into(&self, statement: &mut Statement<'_>) -> Result<(), SqlStewardError> {
        bind_all(statement, &self.arguments)
    }
}

/// Bind `arguments` at positions `1..=arguments.len()`.
pub(crate) fn bind_all(
    statement: &mut Statement<'_>,
    arguments: &[SqlValue],
) -> Result<(), SqlStewardError> {
    let expected = statement.parameter_count();
    if expected != arguments.len() {
        return Err(rusqlite::Error::InvalidParameterCount(arguments.len(), expected).into());
    }
    for (idx, argument) in arguments.iter().enumerate() {
        argument.bind(statement, idx + 1)?;
    }
    Ok(())
}
