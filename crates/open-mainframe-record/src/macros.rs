//! # record_layout!
//!
//! Generates a typed wrapper around [`RecordLayout`](crate::RecordLayout)
//! with one getter and setter per field.
//!
//! ```rust
//! use open_mainframe_record::{record_layout, FieldValue};
//!
//! record_layout! {
//!     /// Customer master record.
//!     pub struct Customer {
//!         cust_id: "9(6)",
//!         cust_name: "X(20)",
//!         balance: "S9(7)V9(2)",
//!     }
//! }
//!
//! let mut rec = Customer::new().unwrap();
//! rec.set_cust_id(42).unwrap();
//! rec.set_cust_name("ACME").unwrap();
//! assert_eq!(rec.cust_id(), FieldValue::from(42));
//! assert_eq!(rec.encode().len(), 36);
//!
//! // Generates:
//! // pub enum CustomerField { cust_id, cust_name, balance }
//! // pub fn cust_id(&self) -> FieldValue
//! // pub fn set_cust_id(&mut self, value) -> Result<()>
//! // ...
//! ```

/// Declare a fixed-width record type with typed field accessors.
#[macro_export]
macro_rules! record_layout {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $pic:literal ),* $(,)?
        }
    ) => {
        $crate::__paste::paste! {
            #[doc = "Field positions of [`" $name "`], in declaration order."]
            #[allow(non_camel_case_types, dead_code)]
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            #[repr(usize)]
            $vis enum [<$name Field>] {
                $( $field ),*
            }

            $(#[$meta])*
            #[derive(Debug, Clone)]
            $vis struct $name {
                layout: $crate::RecordLayout,
            }

            #[allow(dead_code)]
            impl $name {
                /// Field names and PIC clauses, in declaration order.
                pub const FIELDS: &'static [(&'static str, &'static str)] = &[
                    $( (stringify!($field), $pic) ),*
                ];

                /// Create a blank record.
                pub fn new() -> $crate::Result<Self> {
                    Self::with_options($crate::LayoutOptions::default())
                }

                /// Create a blank record with the given options.
                pub fn with_options(options: $crate::LayoutOptions) -> $crate::Result<Self> {
                    Ok(Self {
                        layout: $crate::RecordLayout::with_options(
                            Self::FIELDS.iter().copied(),
                            options,
                        )?,
                    })
                }

                /// Load a whole record.
                pub fn decode(&mut self, record: &str) -> $crate::Result<()> {
                    self.layout.decode(record)
                }

                /// The current record image.
                pub fn encode(&self) -> String {
                    self.layout.encode()
                }

                /// The underlying layout.
                pub fn layout(&self) -> &$crate::RecordLayout {
                    &self.layout
                }

                /// Unwrap into the underlying layout.
                pub fn into_layout(self) -> $crate::RecordLayout {
                    self.layout
                }

                $(
                    $(#[$fmeta])*
                    pub fn $field(&self) -> $crate::FieldValue {
                        self.layout.value_at([<$name Field>]::$field as usize).clone()
                    }

                    #[doc = "Assign `" $field "`."]
                    pub fn [<set_ $field>](
                        &mut self,
                        value: impl Into<$crate::FieldValue>,
                    ) -> $crate::Result<()> {
                        self.layout.set(stringify!($field), value)
                    }
                )*
            }
        }
    };
}
