//! Parsing of raw textual query parameters.
//!
//! Mobile clients send floats with a trailing `f` suffix (`51.07f`) and some
//! wrap values in braces (`{-3.01}`). Both are stripped before parsing.
//! Accounting-style parentheses mark a negative value: `(3.01)` is `-3.01`.
//! Decimal separator is always `.`.

use crate::error::{FenceError, Result};

/// Parse a longitude or latitude parameter named `name`.
pub fn parse_coordinate_param(name: &str, raw: &str) -> Result<f64> {
    let cleaned = raw
        .trim()
        .trim_matches(|c: char| matches!(c, 'f' | 'F' | '{' | '}'))
        .trim();

    if cleaned.is_empty() {
        return Err(FenceError::InvalidArgument(format!(
            "please pass a {name} parameter"
        )));
    }

    let not_a_number =
        || FenceError::InvalidArgument(format!("{name} is not a decimal number: '{raw}'"));

    let value: f64 = match cleaned
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        // A sign inside the parentheses is ambiguous
        Some(inner) if inner.starts_with(['+', '-']) => return Err(not_a_number()),
        Some(inner) => -inner.trim().parse::<f64>().map_err(|_| not_a_number())?,
        None => cleaned.parse().map_err(|_| not_a_number())?,
    };

    if !value.is_finite() {
        return Err(FenceError::InvalidArgument(format!(
            "{name} must be finite: '{raw}'"
        )));
    }

    Ok(value)
}

/// Parse an integer location key.
pub fn parse_location_key(raw: &str) -> Result<i64> {
    let cleaned = raw.trim();
    cleaned.parse().map_err(|_| {
        FenceError::InvalidArgument(format!("location key is not an integer: '{raw}'"))
    })
}
