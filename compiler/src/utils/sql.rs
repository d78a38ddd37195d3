//! SQL utility functions

/// Quote an SQL identifier, doubling any embedded double quotes
///
/// # Example
///
/// ```
/// use filterql::utils::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("createdAt"), "\"createdAt\"");
/// ```
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal using standard SQL escaping (single quotes doubled)
///
/// Assumes `standard_conforming_strings = on`, so backslashes are literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
