//! Error types for record mapping operations.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while parsing PICTURE clauses or mapping records.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RecordError {
    /// Malformed PICTURE clause.
    #[error("Error parsing PIC, expecting PIC with format X(10), 9(5), S9(3)V9(2) or similar")]
    #[diagnostic(
        code(record::pic_format),
        help("Supported forms are X(n), 9(n), S9(n) and an optional V(n) or V9(n) group")
    )]
    PicFormat {
        /// The clause as supplied by the caller.
        picture: String,
    },

    /// Record length does not match the layout width.
    #[error("Expected string of length {expected}")]
    #[diagnostic(code(record::length_mismatch))]
    LengthMismatch {
        /// Total width of the layout.
        expected: usize,
        /// Length of the rejected record.
        actual: usize,
    },

    /// Non-numeric content where a number was expected.
    #[error("Expected a number on property {field}, instead received {received}")]
    #[diagnostic(code(record::type_mismatch))]
    TypeMismatch {
        /// Name of the field.
        field: String,
        /// The offending input, as received.
        received: String,
    },

    /// Value does not fit in the field.
    #[error("Value {value} too big, maximum length of {max}")]
    #[diagnostic(code(record::size))]
    Size {
        /// String form of the rejected value.
        value: String,
        /// Declared field width.
        max: usize,
    },

    /// No field with this name exists in the layout.
    #[error("Unknown property {name}")]
    #[diagnostic(
        code(record::unknown_field),
        help("Field names are matched exactly as declared")
    )]
    UnknownField {
        /// The requested name.
        name: String,
    },

    /// Copybook entry that cannot be mapped to a flat record.
    #[error("Copybook error at line {line}: {message}")]
    #[diagnostic(code(record::copybook))]
    Copybook {
        /// 1-based source line of the entry.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

impl RecordError {
    pub(crate) fn pic_format(picture: &str) -> Self {
        RecordError::PicFormat {
            picture: picture.to_string(),
        }
    }

    pub(crate) fn type_mismatch(field: &str, received: impl Into<String>) -> Self {
        RecordError::TypeMismatch {
            field: field.to_string(),
            received: received.into(),
        }
    }
}
