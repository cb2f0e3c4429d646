//! COBOL PICTURE clause parsing and fixed-width record mapping for OpenMainframe.
//!
//! This crate maps flat fixed-width text records, as written by mainframe
//! batch jobs, to named and typed fields described by COBOL PIC clauses.
//!
//! # Features
//!
//! - **PIC parsing**: `X(n)`, `9(n)`, `S9(n)` and implied decimals `V(n)` / `V9(n)`
//! - **Record codec**: offset table, whole-record decode/encode, per-field get/set
//! - **Implied decimals**: scaled [`Decimal`](rust_decimal::Decimal) access
//! - **Copybooks**: layouts built from COBOL data description entries
//! - **Typed records**: [`record_layout!`] generates per-field accessors
//!
//! DISPLAY data only; binary and packed usages are not supported.
//!
//! # Example
//!
//! ```rust
//! use open_mainframe_record::{parse_pic, FieldKind, FieldValue, RecordLayout};
//!
//! let spec = parse_pic("S9(5)V(2)").unwrap();
//! assert_eq!(spec.kind, FieldKind::Numeric);
//! assert_eq!(spec.width, 8);
//!
//! let mut layout = RecordLayout::new([
//!     ("myProp1", "X(8)"),
//!     ("myProp2", "X(6)"),
//!     ("myProp3", "9(5)"),
//!     ("myProp4", "9(10)"),
//! ])
//! .unwrap();
//!
//! layout.set("myProp1", "A23").unwrap();
//! layout.set("myProp2", "BX").unwrap();
//! layout.set("myProp3", 123).unwrap();
//! layout.set("myProp4", 12345678).unwrap();
//! assert_eq!(layout.encode(), "A23     BX    001230012345678");
//! assert_eq!(layout.get("myProp3").unwrap(), FieldValue::from(123));
//! ```

mod buffer;
pub mod config;
pub mod copybook;
pub mod error;
pub mod layout;
mod macros;
pub mod number;
pub mod picture;
pub mod value;

pub use config::{DecodeMode, LayoutOptions};
pub use copybook::{parse_copybook, CopybookField};
pub use error::RecordError;
pub use layout::{FieldEntry, RecordLayout};
pub use number::parse_number;
pub use picture::{parse_pic, FieldKind, FieldSpec};
pub use value::FieldValue;

#[doc(hidden)]
pub use ::paste as __paste;

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;
