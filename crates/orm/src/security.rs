//! Identifier escaping and validation
//!
//! Values never reach statement text: they are always bound as parameters.
//! Table and column names cannot be bound, so they are validated when a
//! table is declared and double-quoted whenever they are rendered.

use crate::error::ModelError;

/// Longest identifier accepted
const MAX_IDENTIFIER_LEN: usize = 64;

/// Escape a SQL identifier (table name, column name)
///
/// Doubles any embedded double quotes and wraps the result in double quotes.
///
/// ```
/// use quill_orm::security::escape_identifier;
///
/// assert_eq!(escape_identifier("user"), "\"user\"");
/// assert_eq!(escape_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn escape_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Validate that an identifier is a plain name: ASCII letters, digits and
/// underscores, not starting with a digit.
pub fn validate_identifier(identifier: &str) -> Result<(), ModelError> {
    let first = identifier
        .chars()
        .next()
        .ok_or_else(|| ModelError::Validation("Identifier cannot be empty".to_string()))?;

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(ModelError::Validation(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(ModelError::Validation(format!(
            "Identifier '{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() {
        return Err(ModelError::Validation(format!(
            "Identifier '{}' cannot start with a number",
            identifier
        )));
    }

    Ok(())
}
