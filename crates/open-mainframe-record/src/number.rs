//! Numeric text handling for DISPLAY fields.
//!
//! Numeric fields hold their digits as plain characters. This module
//! converts between that text and [`Decimal`] values:
//!
//! - [`parse_number`] reads a numeric slice, tolerating surrounding blanks
//! - [`zero_fill`] left-fills a value to the field width
//! - [`apply_scale`] / [`remove_scale`] move the implied decimal point

use rust_decimal::Decimal;

/// Largest scale a [`Decimal`] can carry.
const MAX_SCALE: u32 = 28;

/// Parse numeric text into a [`Decimal`].
///
/// Surrounding whitespace is ignored and an all-blank string reads as zero.
/// Otherwise the text must be an optional sign, digits with at most one
/// decimal point, and an optional `e`/`E` exponent. Returns `None` for any
/// other content or when the value is outside the range of [`Decimal`].
pub fn parse_number(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Decimal::ZERO);
    }

    let (negative, rest) = split_sign(text);
    let (mantissa, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !is_digits(int_part) || !is_digits(frac_part) {
        return None;
    }

    let exponent = match exponent {
        Some(exp) => {
            let (exp_negative, exp_digits) = split_sign(exp);
            if exp_digits.is_empty() || !is_digits(exp_digits) {
                return None;
            }
            let magnitude: i64 = exp_digits.parse().ok()?;
            if exp_negative {
                -magnitude
            } else {
                magnitude
            }
        }
        None => 0,
    };

    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Decimal::ZERO);
    }
    if digits.len() > 38 {
        return None;
    }

    let mut mantissa: i128 = digits.parse().ok()?;
    let mut scale = (frac_part.len() as i64).checked_sub(exponent)?;

    while scale > i64::from(MAX_SCALE) && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    if scale < 0 {
        let factor = 10i128.checked_pow(u32::try_from(-scale).ok()?)?;
        mantissa = mantissa.checked_mul(factor)?;
        scale = 0;
    }
    if negative {
        mantissa = -mantissa;
    }

    Decimal::try_from_i128_with_scale(mantissa, u32::try_from(scale).ok()?).ok()
}

/// Left-fill numeric text with `'0'` up to `width` characters.
///
/// The fill is purely positional: a sign is treated like any other
/// character, so `-5` at width 4 becomes `00-5`. Text already at or beyond
/// `width` is returned unchanged.
pub fn zero_fill(text: &str, width: usize) -> String {
    format!("{text:0>width$}")
}

/// Shift `value` left by `scale` digits, dropping any remaining fraction.
///
/// `123.456` with scale 2 gives `12345`. Returns `None` on overflow.
pub fn apply_scale(value: Decimal, scale: usize) -> Option<Decimal> {
    let factor = power_of_ten(scale)?;
    Some(value.checked_mul(factor)?.trunc())
}

/// Place the implied decimal point `scale` digits from the right.
///
/// `12345` with scale 2 gives `123.45`. Returns `None` when the resulting
/// scale is beyond what [`Decimal`] supports.
pub fn remove_scale(value: Decimal, scale: usize) -> Option<Decimal> {
    let scale = u32::try_from(scale).ok()?;
    let new_scale = value.scale().checked_add(scale)?;
    Decimal::try_from_i128_with_scale(value.mantissa(), new_scale).ok()
}

fn power_of_ten(exp: usize) -> Option<Decimal> {
    let exp = u32::try_from(exp).ok()?;
    if exp > MAX_SCALE {
        return None;
    }
    Decimal::try_from_i128_with_scale(10i128.checked_pow(exp)?, 0).ok()
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

fn is_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}
