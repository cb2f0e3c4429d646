//! Layout options — decode behavior and text trimming.

use serde::{Deserialize, Serialize};

/// How `decode` behaves when a field fails part way through a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeMode {
    /// Validate every field first; a failing decode changes nothing.
    #[default]
    Atomic,
    /// Update fields in order; fields before the failing one keep their
    /// new values, later fields keep their previous values.
    InPlace,
}

/// Options applied to a [`RecordLayout`](crate::RecordLayout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Failure behavior of `decode`.
    pub decode_mode: DecodeMode,
    /// Trim surrounding whitespace from text fields on decode.
    pub trim_text: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            decode_mode: DecodeMode::Atomic,
            trim_text: true,
        }
    }
}

impl LayoutOptions {
    /// Set the decode mode.
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Set whether text fields are trimmed on decode.
    pub fn with_trim_text(mut self, trim: bool) -> Self {
        self.trim_text = trim;
        self
    }
}
