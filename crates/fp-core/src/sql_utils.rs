//! SQL quoting and literal rendering utilities
//!
//! Profiling builds its aggregate, DDL, and insert statements dynamically, so
//! every identifier and value goes through one of these helpers.

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use fp_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote each component of an already-split qualified name and join with `.`.
///
/// Unlike splitting on `.`, this keeps dots that are part of a component.
///
/// # Examples
/// ```
/// use fp_core::sql_utils::quote_parts;
/// assert_eq!(quote_parts(&["db", "raw", "orders"]), r#""db"."raw"."orders""#);
/// assert_eq!(quote_parts(&["odd.name"]), r#""odd.name""#);
/// ```
pub fn quote_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| quote_ident(p))
        .collect::<Vec<_>>()
        .join(".")
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render an optional string as a SQL literal (`'...'` or `NULL`).
pub fn string_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("'{}'", escape_sql_string(v)),
        None => "NULL".to_string(),
    }
}

/// Render an optional float as a SQL literal.
///
/// Non-finite values have no portable SQL spelling and are written as `NULL`.
pub fn float_literal(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:?}"),
        _ => "NULL".to_string(),
    }
}
