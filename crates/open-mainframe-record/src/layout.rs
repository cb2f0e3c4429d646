//! Record layout: offset table and codec for fixed-width records.
//!
//! A [`RecordLayout`] is built once from an ordered list of
//! `(name, picture)` pairs. Each field occupies the range
//! `[offset, offset + width)` of a single record buffer; the offset of a
//! field is the sum of the widths of the fields declared before it.
//!
//! The buffer is the encoded image of the record. [`RecordLayout::decode`]
//! replaces it whole, [`RecordLayout::set`] rewrites one field's range, and
//! [`RecordLayout::encode`] returns it.
//!
//! # Example
//!
//! ```rust
//! use open_mainframe_record::{FieldValue, RecordLayout};
//!
//! let mut layout = RecordLayout::new([
//!     ("myProp1", "X(8)"),
//!     ("myProp2", "X(6)"),
//!     ("myProp3", "9(5)"),
//!     ("myProp4", "9(10)"),
//! ])
//! .unwrap();
//!
//! layout.decode("A23     BX      1230012345678").unwrap();
//! assert_eq!(layout.get("myProp1").unwrap(), FieldValue::from("A23"));
//! assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(123));
//!
//! layout.set("myProp3", 42).unwrap();
//! assert_eq!(layout.encode(), "A23     BX    000420012345678");
//! ```

use std::collections::HashMap;
use std::ops::Range;

use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::buffer::RecordBuffer;
use crate::config::{DecodeMode, LayoutOptions};
use crate::error::RecordError;
use crate::number::{apply_scale, parse_number, remove_scale, zero_fill};
use crate::picture::{parse_pic, FieldKind, FieldSpec};
use crate::value::FieldValue;
use crate::Result;

/// A named field at a fixed position in the record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldEntry {
    /// Field name as declared.
    pub name: String,
    /// Zero-based start position within the record.
    pub offset: usize,
    /// Storage shape from the PIC clause.
    pub spec: FieldSpec,
}

impl FieldEntry {
    /// Width in characters.
    pub fn width(&self) -> usize {
        self.spec.width
    }

    /// Storage category.
    pub fn kind(&self) -> FieldKind {
        self.spec.kind
    }

    /// Character range occupied in the record.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.spec.width
    }

    fn blank_value(&self) -> FieldValue {
        match self.spec.kind {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Numeric => FieldValue::Number(Decimal::ZERO),
        }
    }

    fn fill_char(&self) -> char {
        match self.spec.kind {
            FieldKind::Text => ' ',
            FieldKind::Numeric => '0',
        }
    }
}

/// Fixed-width record mapped to named, typed fields.
///
/// The set of fields is fixed at construction. Mutation goes through
/// [`decode`](Self::decode), [`set`](Self::set) and [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct RecordLayout {
    fields: Vec<FieldEntry>,
    index: HashMap<String, usize>,
    values: Vec<FieldValue>,
    buffer: RecordBuffer,
    total_width: usize,
    options: LayoutOptions,
}

impl RecordLayout {
    /// Build a layout from `(name, picture)` pairs with default options.
    pub fn new<I, N, P>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        Self::with_options(fields, LayoutOptions::default())
    }

    /// Build a layout from `(name, picture)` pairs.
    ///
    /// Fails with [`RecordError::PicFormat`] on the first clause that does
    /// not parse; no layout is produced in that case.
    pub fn with_options<I, N, P>(fields: I, options: LayoutOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        for (name, picture) in fields {
            let spec = parse_pic(picture.as_ref())?;
            let width = spec.width;
            entries.push(FieldEntry {
                name: name.into(),
                offset,
                spec,
            });
            offset = offset
                .checked_add(width)
                .ok_or_else(|| RecordError::pic_format(picture.as_ref()))?;
        }

        // Later declarations shadow earlier ones with the same name.
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        let mut layout = Self {
            values: Vec::with_capacity(entries.len()),
            buffer: RecordBuffer::blank(offset),
            fields: entries,
            index,
            total_width: offset,
            options,
        };
        layout.clear();
        debug_assert_eq!(layout.buffer.len(), layout.total_width);

        tracing::debug!(
            fields = layout.fields.len(),
            total_width = layout.total_width,
            "Record layout built"
        );
        Ok(layout)
    }

    /// Total record width in characters.
    pub fn total_width(&self) -> usize {
        self.total_width
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the layout declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Options in effect.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Declared fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Every declared field name, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Reset every field to blank: spaces for text, zeros for numbers.
    pub fn clear(&mut self) {
        self.values = self.fields.iter().map(FieldEntry::blank_value).collect();
        for field in &self.fields {
            self.buffer.fill(field.range(), field.fill_char());
        }
    }

    /// Load a whole record.
    ///
    /// The record must be exactly [`total_width`](Self::total_width)
    /// characters long. Numeric fields must hold a number, surrounding
    /// blanks allowed; text fields are trimmed unless
    /// [`LayoutOptions::trim_text`] is off.
    pub fn decode(&mut self, record: &str) -> Result<()> {
        let chars: Vec<char> = record.chars().collect();
        if chars.len() != self.total_width {
            tracing::debug!(
                expected = self.total_width,
                actual = chars.len(),
                "Record length mismatch"
            );
            return Err(RecordError::LengthMismatch {
                expected: self.total_width,
                actual: chars.len(),
            });
        }

        match self.options.decode_mode {
            DecodeMode::Atomic => {
                let values = self
                    .fields
                    .iter()
                    .map(|field| self.decode_field(field, &chars))
                    .collect::<Result<Vec<_>>>()?;
                self.values = values;
            }
            DecodeMode::InPlace => {
                for i in 0..self.fields.len() {
                    let value = self.decode_field(&self.fields[i], &chars)?;
                    let range = self.fields[i].range();
                    let raw: String = chars[range.clone()].iter().collect();
                    self.buffer.splice(range, &raw);
                    self.values[i] = value;
                }
            }
        }

        self.buffer.replace_all(&chars);
        Ok(())
    }

    fn decode_field(&self, field: &FieldEntry, record: &[char]) -> Result<FieldValue> {
        let raw: String = record[field.range()].iter().collect();
        tracing::trace!(
            field = %field.name,
            offset = field.offset,
            width = field.width(),
            "Decoding field"
        );

        match field.spec.kind {
            FieldKind::Numeric => parse_number(&raw).map(FieldValue::Number).ok_or_else(|| {
                tracing::debug!(field = %field.name, received = %raw, "Non-numeric field content");
                RecordError::type_mismatch(&field.name, raw)
            }),
            FieldKind::Text if self.options.trim_text => {
                Ok(FieldValue::Text(raw.trim().to_string()))
            }
            FieldKind::Text => Ok(FieldValue::Text(raw)),
        }
    }

    /// The current record image, always [`total_width`](Self::total_width)
    /// characters long.
    pub fn encode(&self) -> String {
        self.buffer.to_string()
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        let i = self.position(name)?;
        Ok(self.values[i].clone())
    }

    /// Current value of the field at `index` in declaration order.
    ///
    /// Backs the getters generated by [`record_layout!`](crate::record_layout),
    /// whose field indexes always match the layout. Panics if
    /// `index >= self.len()`.
    #[doc(hidden)]
    pub fn value_at(&self, index: usize) -> &FieldValue {
        &self.values[index]
    }

    /// Raw characters currently stored for a field.
    pub fn raw(&self, name: &str) -> Result<String> {
        let i = self.position(name)?;
        Ok(self.buffer.slice(self.fields[i].range()))
    }

    /// Assign a field.
    ///
    /// Numeric fields require a value that reads as a number. The string
    /// form of the value, exactly as given, may not be longer than the
    /// field. Numbers are left-filled with zeros and text is right-padded
    /// with spaces; the rest of the record is left untouched.
    ///
    /// The fill is positional only. `-42` in `S9(4)` is stored as `00-42`,
    /// which does not decode back; use [`set_decimal`](Self::set_decimal)
    /// for a leading sign.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let i = self.position(name)?;
        let value = value.into();
        let field = &self.fields[i];
        let width = field.width();

        let (text, cached) = match field.spec.kind {
            FieldKind::Numeric => {
                let text = value.to_string();
                let number = parse_number(&text).ok_or_else(|| {
                    tracing::debug!(field = %field.name, received = %value, "Non-numeric value");
                    RecordError::type_mismatch(&field.name, text.clone())
                })?;
                (text, FieldValue::Number(number))
            }
            FieldKind::Text => {
                let text = value.to_string();
                (text.clone(), FieldValue::Text(text))
            }
        };

        if text.chars().count() > width {
            tracing::debug!(field = %field.name, width, "Value too long for field");
            return Err(RecordError::Size {
                value: text,
                max: width,
            });
        }

        let padded = match field.spec.kind {
            FieldKind::Numeric => zero_fill(&text, width),
            FieldKind::Text => format!("{text:<width$}"),
        };

        tracing::trace!(field = %field.name, offset = field.offset, width, "Assigning field");
        let range = field.range();
        let written = self.buffer.splice(range, &padded);
        debug_assert!(written, "padded value must fill the field range");
        self.values[i] = cached;
        Ok(())
    }

    /// Numeric value with the implied decimal point applied.
    ///
    /// For `9(3)V9(2)` holding `12345` this returns `123.45`.
    ///
    /// Text fields fail with [`RecordError::TypeMismatch`]. A field whose
    /// implied scale pushes the value past the 28 fraction digits a
    /// [`Decimal`] can hold fails with [`RecordError::TypeMismatch`] too,
    /// since the stored digits cannot be read as a decimal.
    pub fn get_decimal(&self, name: &str) -> Result<Decimal> {
        let i = self.position(name)?;
        let field = &self.fields[i];
        let value = &self.values[i];
        let mismatch = || RecordError::type_mismatch(&field.name, value.to_string());
        let number = value.as_number().ok_or_else(mismatch)?;
        remove_scale(number, field.spec.scale()).ok_or_else(mismatch)
    }

    /// Store a decimal value, moving the implied decimal point into the
    /// stored digits.
    ///
    /// Fraction digits beyond the implied scale are truncated. Signed fields
    /// get an explicit leading `+` or `-`.
    pub fn set_decimal(&mut self, name: &str, value: Decimal) -> Result<()> {
        let i = self.position(name)?;
        let field = &self.fields[i];
        let spec = &field.spec;

        if !spec.is_numeric() || (value.is_sign_negative() && !value.is_zero() && !spec.signed) {
            return Err(RecordError::type_mismatch(&field.name, value.to_string()));
        }

        let too_big = || RecordError::Size {
            value: value.to_string(),
            max: spec.width,
        };
        let scaled = apply_scale(value, spec.scale()).ok_or_else(too_big)?;
        let digits = scaled.abs().trunc().to_string();
        if digits.len() > spec.digit_count() {
            return Err(too_big());
        }

        let digits = zero_fill(&digits, spec.digit_count());
        let text = if !spec.signed {
            digits
        } else if scaled.is_sign_negative() && !scaled.is_zero() {
            format!("-{digits}")
        } else {
            format!("+{digits}")
        };

        let name = field.name.clone();
        self.set(&name, text)
    }

    /// Ordered snapshot of every field value.
    pub fn values(&self) -> Vec<(&str, FieldValue)> {
        self.fields
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.name.as_str(), v.clone()))
            .collect()
    }

    /// Field values as a JSON object in declaration order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (field, value) in self.fields.iter().zip(&self.values) {
            map.insert(
                field.name.clone(),
                serde_json::to_value(value).unwrap_or_default(),
            );
        }
        serde_json::Value::Object(map)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RecordError::UnknownField {
                name: name.to_string(),
            })
    }
}

impl Serialize for RecordLayout {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in self.fields.iter().zip(&self.values) {
            map.serialize_entry(&field.name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn simple() -> RecordLayout {
        RecordLayout::new([
            ("myProp1", "X(8)"),
            ("myProp2", "X(6)"),
            ("myProp3", "9(5)"),
            ("myProp4", "9(10)"),
        ])
        .unwrap()
    }

    #[test]
    fn test_offsets() {
        let layout = simple();
        assert_eq!(layout.total_width(), 29);
        let offsets: Vec<usize> = layout.fields().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 14, 19]);
        assert_eq!(layout.field("myProp4").unwrap().range(), 19..29);
    }

    #[test]
    fn test_initial_state_is_blank() {
        let layout = simple();
        assert_eq!(layout.encode(), format!("{}{}", " ".repeat(14), "0".repeat(15)));
        assert_eq!(layout.get("myProp1").unwrap(), FieldValue::from(""));
        assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(0));
    }

    #[test]
    fn test_bad_picture_aborts_construction() {
        let err = RecordLayout::new([("a", "X(2)"), ("b", "S9999")]).unwrap_err();
        assert!(matches!(err, RecordError::PicFormat { .. }));
    }

    #[test]
    fn test_decode() {
        let mut layout = simple();
        layout.decode("A23     BX      1230012345678").unwrap();
        assert_eq!(layout.get("myProp1").unwrap(), FieldValue::from("A23"));
        assert_eq!(layout.get("myProp2").unwrap(), FieldValue::from("BX"));
        assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(123));
        assert_eq!(layout.get("myProp4").unwrap(), FieldValue::from(12345678));
        assert_eq!(layout.encode(), "A23     BX      1230012345678");
    }

    #[test]
    fn test_decode_blank_numeric_reads_zero() {
        let mut layout = RecordLayout::new([("n", "9(3)")]).unwrap();
        layout.decode("   ").unwrap();
        assert_eq!(layout.get("n").unwrap(), FieldValue::from(0));
    }

    #[test]
    fn test_decode_untrimmed_text() {
        let opts = LayoutOptions::default().with_trim_text(false);
        let mut layout = RecordLayout::with_options([("t", "X(5)")], opts).unwrap();
        layout.decode(" AB  ").unwrap();
        assert_eq!(layout.get("t").unwrap(), FieldValue::from(" AB  "));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut layout = simple();
        let err = layout.decode("A23     BX      12300123456789").unwrap_err();
        assert_eq!(err.to_string(), "Expected string of length 29");
        assert!(matches!(
            err,
            RecordError::LengthMismatch {
                expected: 29,
                actual: 30
            }
        ));
    }

    #[test]
    fn test_decode_type_mismatch_reports_raw_slice() {
        let mut layout = simple();
        let err = layout.decode("A23     BX    Test 0012345678").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected a number on property myProp3, instead received Test "
        );
    }

    #[test]
    fn test_atomic_decode_failure_keeps_state() {
        let mut layout = simple();
        layout.decode("A23     BX      1230012345678").unwrap();
        let before = layout.encode();

        assert!(layout.decode("ZZZ     QQ    Test 0012345678").is_err());
        assert_eq!(layout.encode(), before);
        assert_eq!(layout.get("myProp1").unwrap(), FieldValue::from("A23"));
    }

    #[test]
    fn test_in_place_decode_failure_is_reported() {
        let opts = LayoutOptions::default().with_decode_mode(DecodeMode::InPlace);
        let mut layout = RecordLayout::with_options([("a", "X(2)"), ("b", "9(2)")], opts).unwrap();
        let err = layout.decode("ABxx").unwrap_err();
        assert!(matches!(err, RecordError::TypeMismatch { ref field, .. } if field == "b"));
        assert_eq!(layout.encode().chars().count(), 4);
    }

    #[test]
    fn test_set_and_encode() {
        let mut layout = simple();
        layout.set("myProp1", "A23").unwrap();
        layout.set("myProp2", "BX").unwrap();
        layout.set("myProp3", 123).unwrap();
        layout.set("myProp4", 12345678).unwrap();
        assert_eq!(layout.encode(), "A23     BX    001230012345678");
    }

    #[test]
    fn test_set_touches_only_its_range() {
        let mut layout = simple();
        layout.decode("A23     BX      1230012345678").unwrap();
        layout.set("myProp2", "CD").unwrap();
        assert_eq!(layout.encode(), "A23     CD      1230012345678");
        assert_eq!(layout.get("myProp2").unwrap(), FieldValue::from("CD"));
    }

    #[test]
    fn test_set_numeric_from_text() {
        let mut layout = simple();
        layout.set("myProp3", "77").unwrap();
        assert_eq!(layout.raw("myProp3").unwrap(), "00077");
        assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(77));

        layout.set("myProp3", " 77").unwrap();
        assert_eq!(layout.raw("myProp3").unwrap(), "00 77");
        assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(77));
    }

    #[test]
    fn test_set_counts_surrounding_blanks() {
        let mut layout = RecordLayout::new([("n", "9(3)")]).unwrap();
        let err = layout.set("n", " 123").unwrap_err();
        assert!(matches!(err, RecordError::Size { max: 3, .. }));
        assert_eq!(err.to_string(), "Value  123 too big, maximum length of 3");
        assert_eq!(layout.encode(), "000");
    }

    #[test]
    fn test_set_too_long() {
        let mut layout = simple();
        let err = layout.set("myProp2", "TestSTR").unwrap_err();
        assert_eq!(err.to_string(), "Value TestSTR too big, maximum length of 6");

        let err = layout.set("myProp3", 123456).unwrap_err();
        assert_eq!(err.to_string(), "Value 123456 too big, maximum length of 5");
    }

    #[test]
    fn test_set_non_numeric() {
        let mut layout = simple();
        let err = layout.set("myProp3", "TestSTR").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected a number on property myProp3, instead received TestSTR"
        );
        assert_eq!(layout.raw("myProp3").unwrap(), "00000");
    }

    #[test]
    fn test_set_negative_fills_left_of_sign() {
        let mut layout = RecordLayout::new([("n", "S9(4)")]).unwrap();
        layout.set("n", -42).unwrap();
        assert_eq!(layout.encode(), "00-42");
        assert_eq!(layout.get("n").unwrap(), FieldValue::from(-42));

        layout.set_decimal("n", Decimal::from(-42)).unwrap();
        assert_eq!(layout.encode(), "-0042");
    }

    #[test]
    fn test_unknown_field() {
        let mut layout = simple();
        assert!(matches!(
            layout.get("nope"),
            Err(RecordError::UnknownField { .. })
        ));
        assert!(layout.set("nope", "x").is_err());
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let mut layout = RecordLayout::new([("dup", "X(2)"), ("dup", "X(3)")]).unwrap();
        assert_eq!(layout.field_names(), vec!["dup", "dup"]);
        layout.set("dup", "ABC").unwrap();
        assert_eq!(layout.encode(), "  ABC");
    }

    #[test]
    fn test_decimal_accessors() {
        let mut layout = RecordLayout::new([("amt", "S9(5)V(2)"), ("rate", "9(1)V9(3)")]).unwrap();
        layout
            .set_decimal("amt", Decimal::from_str("-123.456").unwrap())
            .unwrap();
        layout
            .set_decimal("rate", Decimal::from_str("2.5").unwrap())
            .unwrap();
        assert_eq!(layout.encode(), "-00123452500");
        assert_eq!(
            layout.get_decimal("amt").unwrap(),
            Decimal::from_str("-123.45").unwrap()
        );
        assert_eq!(
            layout.get_decimal("rate").unwrap(),
            Decimal::from_str("2.5").unwrap()
        );
    }

    #[test]
    fn test_set_decimal_rejections() {
        let mut layout = RecordLayout::new([("u", "9(2)V9(1)"), ("t", "X(3)")]).unwrap();
        assert!(matches!(
            layout.set_decimal("u", Decimal::from(-1)),
            Err(RecordError::TypeMismatch { .. })
        ));
        assert!(matches!(
            layout.set_decimal("u", Decimal::from(100)),
            Err(RecordError::Size { .. })
        ));
        assert!(layout.set_decimal("t", Decimal::ONE).is_err());
        assert!(matches!(
            layout.get_decimal("t"),
            Err(RecordError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_get_decimal_beyond_decimal_scale() {
        let layout = RecordLayout::new([("tiny", "9(1)V9(29)")]).unwrap();
        assert!(matches!(
            layout.get_decimal("tiny"),
            Err(RecordError::TypeMismatch { ref field, .. }) if field == "tiny"
        ));
    }

    #[test]
    fn test_clear() {
        let mut layout = simple();
        layout.decode("A23     BX      1230012345678").unwrap();
        layout.clear();
        assert_eq!(layout.buffer.len(), layout.total_width);
        assert_eq!(layout.encode(), simple().encode());
        assert_eq!(layout.get("myProp4").unwrap(), FieldValue::from(0));
    }

    #[test]
    fn test_json_snapshot() {
        let mut layout = simple();
        layout.decode("A23     BX      1230012345678").unwrap();
        let json = layout.to_json();
        assert_eq!(
            json,
            serde_json::json!({
                "myProp1": "A23",
                "myProp2": "BX",
                "myProp3": 123,
                "myProp4": 12345678
            })
        );
        assert_eq!(serde_json::to_value(&layout).unwrap(), json);
    }
}
