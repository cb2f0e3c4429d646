//! Fixed-size record buffer.
//!
//! Holds the encoded image of a whole record. The length is fixed when the
//! buffer is created; every write replaces a range of the same length.

use std::fmt::{self, Write};
use std::ops::Range;

/// Character buffer of a fixed-width record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordBuffer {
    chars: Vec<char>,
}

impl RecordBuffer {
    /// Create a buffer of `width` spaces.
    pub fn blank(width: usize) -> Self {
        Self {
            chars: vec![' '; width],
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Fill `range` with `ch`. Returns `false`, leaving the buffer
    /// untouched, when the range is out of bounds.
    pub fn fill(&mut self, range: Range<usize>, ch: char) -> bool {
        match self.chars.get_mut(range) {
            Some(slot) => {
                slot.fill(ch);
                true
            }
            None => false,
        }
    }

    /// Replace `range` with `text`.
    ///
    /// `text` must have exactly `range.len()` characters and the range must
    /// lie within the buffer; otherwise nothing is written and `false` is
    /// returned.
    pub fn splice(&mut self, range: Range<usize>, text: &str) -> bool {
        let width = range.len();
        let Some(slot) = self.chars.get_mut(range) else {
            return false;
        };
        if text.chars().count() != width {
            return false;
        }
        for (dst, src) in slot.iter_mut().zip(text.chars()) {
            *dst = src;
        }
        true
    }

    /// Replace the whole buffer. Returns `false` when `record` has a
    /// different length.
    pub fn replace_all(&mut self, record: &[char]) -> bool {
        if record.len() != self.chars.len() {
            return false;
        }
        self.chars.copy_from_slice(record);
        true
    }

    /// Characters in `range` as a string, empty when out of bounds.
    pub fn slice(&self, range: Range<usize>) -> String {
        self.chars
            .get(range)
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for RecordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| f.write_char(*c))
    }
}
