//! Canonicalization of multi-valued catalog fields.
//!
//! Historical catalog exports encode `state` and `areas` in several ways:
//! native JSON arrays, stringified lists with single or double quotes, and
//! bare strings. Everything is folded into a `BTreeSet<String>` here so the
//! matching engine only ever sees sets.

use serde_json::Value;
use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Result of normalizing one multi-valued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedField {
    pub values: BTreeSet<String>,
    /// Set when the raw value could not be read as a list and the fallback was used.
    pub recovered: Option<String>,
}

impl NormalizedField {
    fn clean(values: BTreeSet<String>) -> Self {
        Self { values, recovered: None }
    }

    fn fallback(literal: String, reason: String) -> Self {
        Self {
            values: BTreeSet::from([literal]),
            recovered: Some(reason),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListLiteralError {
    #[error("list literal must start with '['")]
    MissingOpen,
    #[error("unterminated string starting at element {0}")]
    UnterminatedString(usize),
    #[error("unquoted element '{0}' is not a number")]
    BareElement(String),
    #[error("expected ',' or ']' after element {0}")]
    MissingSeparator(usize),
    #[error("list literal is not closed")]
    Unclosed,
    #[error("unexpected trailing input after ']'")]
    TrailingInput,
}

/// Normalize a raw JSON field value into a set of strings. Never fails.
pub fn normalize_multi_value(raw: &Value) -> NormalizedField {
    match raw {
        Value::Array(items) => NormalizedField::clean(items.iter().filter_map(element_to_string).collect()),
        Value::String(text) => normalize_text(text),
        Value::Null => NormalizedField {
            values: BTreeSet::new(),
            recovered: Some("field is null".to_string()),
        },
        other => NormalizedField::fallback(other.to_string(), format!("unexpected JSON {}", json_kind(other))),
    }
}

fn normalize_text(text: &str) -> NormalizedField {
    let trimmed = text.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return NormalizedField::clean(BTreeSet::from([text.to_string()]));
    }

    match parse_list_literal(trimmed) {
        Ok(items) => NormalizedField::clean(items.into_iter().collect()),
        Err(e) => NormalizedField::fallback(text.to_string(), e.to_string()),
    }
}

fn element_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a serialized list such as `['Bayern', "Berlin"]`.
///
/// Elements may be single- or double-quoted and use backslash escapes.
/// Unquoted numeric elements are accepted and kept as their text.
pub fn parse_list_literal(input: &str) -> Result<Vec<String>, ListLiteralError> {
    let mut chars = input.trim().chars().peekable();
    if chars.next() != Some('[') {
        return Err(ListLiteralError::MissingOpen);
    }

    let mut items = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.peek().copied() {
            None => return Err(ListLiteralError::Unclosed),
            Some(']') => {
                chars.next();
                break;
            }
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                items.push(read_quoted(&mut chars, quote, items.len())?);
            }
            Some(_) => items.push(read_bare(&mut chars)?),
        }

        skip_whitespace(&mut chars);
        match chars.next() {
            // trailing comma before ']' is tolerated on the next turn
            Some(',') => continue,
            Some(']') => break,
            Some(_) => return Err(ListLiteralError::MissingSeparator(items.len() - 1)),
            None => return Err(ListLiteralError::Unclosed),
        }
    }

    skip_whitespace(&mut chars);
    if chars.next().is_some() {
        return Err(ListLiteralError::TrailingInput);
    }
    Ok(items)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char, index: usize) -> Result<String, ListLiteralError> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(escaped) => out.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(out),
            c => out.push(c),
        }
    }
    Err(ListLiteralError::UnterminatedString(index))
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> Result<String, ListLiteralError> {
    let mut token = String::new();
    while let Some(&c) = chars.peek() {
        if c == ',' || c == ']' {
            break;
        }
        token.push(c);
        chars.next();
    }

    let token = token.trim().to_string();
    if token.parse::<f64>().is_ok() {
        Ok(token)
    } else {
        Err(ListLiteralError::BareElement(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_native_list_is_used_directly() {
        let field = normalize_multi_value(&json!(["Bayern", "Berlin", "Bayern"]));
        assert_eq!(field.values, set(&["Bayern", "Berlin"]));
        assert!(field.recovered.is_none());
    }

    #[test]
    fn test_single_quoted_list_string_is_parsed() {
        let field = normalize_multi_value(&json!("['digital', 'energy']"));
        assert_eq!(field.values, set(&["digital", "energy"]));
        assert!(field.recovered.is_none());
    }

    #[test]
    fn test_double_quoted_list_string_is_parsed() {
        let field = normalize_multi_value(&json!(r#"["Hessen", "bundesweit"]"#));
        assert_eq!(field.values, set(&["Hessen", "bundesweit"]));
    }

    #[test]
    fn test_mixed_quoting_and_apostrophes() {
        let parsed = parse_list_literal(r#"["Baden-Württemberg", 'it\'s', "a, b"]"#).unwrap();
        assert_eq!(parsed, vec!["Baden-Württemberg", "it's", "a, b"]);
    }

    #[test]
    fn test_bare_string_becomes_single_element() {
        let field = normalize_multi_value(&json!("bundesweit"));
        assert_eq!(field.values, set(&["bundesweit"]));
        assert!(field.recovered.is_none());
    }

    #[test]
    fn test_malformed_list_falls_back_to_literal() {
        let raw = "['Bayern', 'Berlin']x]";
        let field = normalize_multi_value(&json!(raw));
        assert_eq!(field.values, set(&[raw]));
        assert!(field.recovered.is_some());

        let unquoted = normalize_multi_value(&json!("[Bayern, Berlin]"));
        assert_eq!(unquoted.values, set(&["[Bayern, Berlin]"]));
        assert!(unquoted.recovered.is_some());
    }

    #[test]
    fn test_empty_and_trailing_comma_lists() {
        assert_eq!(parse_list_literal("[]").unwrap(), Vec::<String>::new());
        assert_eq!(parse_list_literal("[ 'a', ]").unwrap(), vec!["a"]);
        assert_eq!(parse_list_literal("[1, 2.5]").unwrap(), vec!["1", "2.5"]);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert_eq!(
            parse_list_literal("['abc]"),
            Err(ListLiteralError::UnterminatedString(0))
        );
    }

    #[test]
    fn test_non_string_scalars_are_recovered() {
        let field = normalize_multi_value(&json!(42));
        assert_eq!(field.values, set(&["42"]));
        assert!(field.recovered.is_some());

        let null = normalize_multi_value(&Value::Null);
        assert!(null.values.is_empty());
        assert!(null.recovered.is_some());
    }
}
