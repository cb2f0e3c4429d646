//! PICTURE clause parsing.
//!
//! Resolves a PIC clause into the storage shape of one DISPLAY field:
//!
//! - `X(n)` — alphanumeric, `n` characters
//! - `9(n)` — unsigned numeric, `n` digits
//! - `S9(n)` — signed numeric, one sign position plus `n` digits
//! - `V(n)` / `V9(n)` — `n` digits after an implied decimal point
//!
//! The decimal point itself is never stored, so `S9(5)V(2)` is 8 wide.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::Result;

/// Storage category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Alphanumeric (X), right-padded with spaces.
    Text,
    /// Numeric DISPLAY (9), left-filled with zeros.
    Numeric,
}

/// Field descriptor derived from one PIC clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Normalized (trimmed, upper-cased) picture string.
    pub picture: String,
    /// Storage category.
    pub kind: FieldKind,
    /// Width in characters, including the sign position.
    pub width: usize,
    /// Whether a sign position is reserved.
    pub signed: bool,
    /// Digits after the implied decimal point.
    pub implied_decimal_digits: Option<usize>,
}

impl FieldSpec {
    /// Whether this is a numeric field.
    pub fn is_numeric(&self) -> bool {
        self.kind == FieldKind::Numeric
    }

    /// Number of digit positions (width without the sign position).
    pub fn digit_count(&self) -> usize {
        self.width - usize::from(self.signed)
    }

    /// Number of digits before the implied decimal point.
    pub fn integer_digits(&self) -> usize {
        self.digit_count()
            .saturating_sub(self.implied_decimal_digits.unwrap_or(0))
    }

    /// Implied decimal digits, zero when no `V` group is present.
    pub fn scale(&self) -> usize {
        self.implied_decimal_digits.unwrap_or(0)
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.picture)
    }
}

impl std::str::FromStr for FieldSpec {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        parse_pic(s)
    }
}

/// Parse a PICTURE clause such as `X(8)`, `9(5)` or `S9(5)V(2)`.
///
/// Anything that does not start with `X` is read as a numeric picture.
pub fn parse_pic(clause: &str) -> Result<FieldSpec> {
    let picture = clause.trim().to_uppercase();

    let parsed = if picture.starts_with('X') {
        parse_alphanumeric(&picture)
    } else {
        parse_numeric(&picture)
    };

    parsed.ok_or_else(|| {
        tracing::debug!(picture = %clause, "Rejected PIC clause");
        RecordError::pic_format(clause)
    })
}

fn parse_alphanumeric(picture: &str) -> Option<FieldSpec> {
    let width = picture
        .strip_prefix("X(")?
        .strip_suffix(')')
        .and_then(parse_count)?;

    Some(FieldSpec {
        picture: picture.to_string(),
        kind: FieldKind::Text,
        width,
        signed: false,
        implied_decimal_digits: None,
    })
}

fn parse_numeric(picture: &str) -> Option<FieldSpec> {
    let (signed, body) = match picture.strip_prefix('S') {
        Some(rest) => (true, rest),
        None => (false, picture),
    };

    let mut digits = 0usize;
    let mut implied = None;

    for slice in body.split(')').filter(|s| !s.is_empty()) {
        let (prefix, count) = slice.split_once('(')?;
        let count = parse_count(count)?;
        match prefix {
            "9" => {}
            "V" | "V9" => {
                if implied.is_some() {
                    return None;
                }
                implied = Some(count);
            }
            _ => return None,
        }
        digits = digits.checked_add(count)?;
    }

    if digits == 0 {
        return None;
    }

    Some(FieldSpec {
        picture: picture.to_string(),
        kind: FieldKind::Numeric,
        width: digits.checked_add(usize::from(signed))?,
        signed,
        implied_decimal_digits: implied,
    })
}

/// Repeat count inside parentheses: a positive decimal integer.
fn parse_count(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<usize>().ok().filter(|&n| n > 0)
}
