//! Filter query parser for the chat list.
//!
//! # Syntax
//!
//! ```text
//! filter_expr  := field_filter (operator? field_filter)*
//! field_filter := field:value | field:"quoted value"
//! operator     := AND | OR (case-insensitive)
//! field        := with | type | since | unread (case-insensitive)
//! ```
//!
//! Without an explicit operator, repeated fields are OR'd (`with:ana with:ben`) and different
//! fields are AND'd (`with:ana unread:true`).
//!
//! # Examples
//!
//! ```rust
//! # use haccp_chat::filters::parse_filter;
//! let expr = parse_filter("type:group unread:true").unwrap();
//! assert_eq!(expr.filters.len(), 2);
//!
//! let expr = parse_filter("with:\"Line 2\" OR since:2025-01-01").unwrap();
//! assert_eq!(expr.filters[0].value, "Line 2");
//! ```

use std::iter::Peekable;
use std::str::Chars;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;

use super::ast::{FieldFilter, FilterExpr, FilterField, FilterOperator};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    FieldValue { field: String, value: String },
    And,
    Or,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let word = read_word(&mut chars);
        match word.to_uppercase().as_str() {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            _ => {
                let Some((field, value)) = word.split_once(':') else {
                    bail!("Invalid token: '{}' (expected field:value or AND/OR)", word);
                };
                let value = if value.starts_with('"') {
                    read_quoted_value(&mut chars, value)?
                } else {
                    value.to_string()
                };
                if field.is_empty() || value.is_empty() {
                    bail!("Invalid field:value format: {}", word);
                }
                tokens.push(Token::FieldValue { field: field.to_string(), value });
            }
        }
    }

    Ok(tokens)
}

fn read_word(chars: &mut Peekable<Chars>) -> String {
    let mut word = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            break;
        }
        word.push(ch);
        chars.next();
    }
    word
}

/// Complete a quoted value whose opening quote (and maybe more) is in `initial`
fn read_quoted_value(chars: &mut Peekable<Chars>, initial: &str) -> Result<String> {
    let mut value = initial[1..].to_string();
    if let Some(end) = value.find('"') {
        value.truncate(end);
        return Ok(value);
    }

    for ch in chars.by_ref() {
        if ch == '"' {
            return Ok(value);
        }
        value.push(ch);
    }

    Err(anyhow!("Unterminated quoted string"))
}

fn parse_field(field: &str) -> Result<FilterField> {
    match field.to_lowercase().as_str() {
        "with" => Ok(FilterField::With),
        "type" => Ok(FilterField::Type),
        "since" => Ok(FilterField::Since),
        "unread" => Ok(FilterField::Unread),
        _ => Err(anyhow!("Unknown field: '{}' (valid fields: with, type, since, unread)", field)),
    }
}

fn validate_value(field: FilterField, value: &str) -> Result<()> {
    match field {
        FilterField::Type => match value.to_lowercase().as_str() {
            "direct" | "group" => Ok(()),
            _ => Err(anyhow!("Invalid type value: '{}' (must be 'direct' or 'group')", value)),
        },
        FilterField::Unread => match value.to_lowercase().as_str() {
            "true" | "false" => Ok(()),
            _ => Err(anyhow!("Invalid unread value: '{}' (must be 'true' or 'false')", value)),
        },
        FilterField::Since => {
            if !is_valid_date_format(value) {
                bail!("Invalid date format: '{}' (expected YYYY-MM-DD)", value);
            }
            Ok(())
        }
        FilterField::With => Ok(()),
    }
}

/// Strict YYYY-MM-DD that also names a real day
fn is_valid_date_format(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Parse a filter string into a [`FilterExpr`]
///
/// Blank input parses to an empty expression, which matches every thread.
pub fn parse_filter(input: &str) -> Result<FilterExpr> {
    let tokens = tokenize(input).context("Failed to tokenize filter")?;

    let mut expr = FilterExpr::new();
    let mut expecting_filter = true;
    let mut last_field: Option<FilterField> = None;

    for token in tokens {
        match token {
            Token::FieldValue { field, value } => {
                let field = parse_field(&field)?;
                validate_value(field, &value)?;

                if !expecting_filter {
                    let implicit = match last_field {
                        Some(previous) if previous == field => FilterOperator::Or,
                        _ => FilterOperator::And,
                    };
                    expr.add_operator(implicit);
                }

                expr.add_filter(FieldFilter::new(field, value));
                last_field = Some(field);
                expecting_filter = false;
            }
            Token::And | Token::Or => {
                if expecting_filter {
                    bail!("Unexpected {:?} operator (expected field:value)", token);
                }
                expr.add_operator(if token == Token::And {
                    FilterOperator::And
                } else {
                    FilterOperator::Or
                });
                expecting_filter = true;
            }
        }
    }

    if expecting_filter && !expr.is_empty() {
        bail!("Filter ended with operator (expected field:value)");
    }

    Ok(expr)
}
