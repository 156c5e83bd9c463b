//! Error types for treecast conversion operations.
//!
//! These are the data errors raised while an installed routine runs. Errors
//! detected while a routine is being generated live in `treecast-codegen`.

use thiserror::Error;

/// Core error type for encoding and decoding record values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A required field is absent from the input mapping.
    #[error("field \"{field}\" of type {type_name} is missing in {record} instance")]
    MissingField {
        /// Field name.
        field: String,
        /// Declared type of the field.
        type_name: String,
        /// Qualified name of the owning record type.
        record: String,
    },

    /// The argument handed to a routine has the wrong shape.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// A value does not have the shape its declared type requires.
    #[error("field \"{field}\": expected {expected}, found {found}")]
    Mismatch {
        /// Field name.
        field: String,
        /// Expected shape.
        expected: String,
        /// Shape actually found.
        found: String,
    },

    /// A value has the right shape but its content cannot be converted.
    #[error("field \"{field}\": invalid value: {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Description of the problem.
        reason: String,
    },

    /// No enumeration member carries the given underlying value.
    #[error("{value} is not a valid {enum_name}")]
    UnknownEnumValue {
        /// Qualified name of the enumeration.
        enum_name: String,
        /// Rendered underlying value.
        value: String,
    },

    /// None of the alternatives of a union could convert the value.
    #[error("field \"{field}\": value does not match any alternative of {type_name}")]
    NoMatchingVariant {
        /// Field name.
        field: String,
        /// Declared union type.
        type_name: String,
    },

    /// A record type was used before its routines were installed.
    #[error("no {direction} routine installed for {record}")]
    NotInstalled {
        /// Qualified name of the record type.
        record: String,
        /// Routine direction (`encode` or `decode`).
        direction: &'static str,
    },
}

impl Error {
    /// Creates a shape mismatch error.
    pub fn mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if the error reports a value of the wrong shape or content.
    ///
    /// Union conversion uses this to decide whether the next alternative may
    /// still succeed.
    #[must_use]
    pub const fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::Mismatch { .. }
                | Self::InvalidValue { .. }
                | Self::UnknownEnumValue { .. }
                | Self::NoMatchingVariant { .. }
        )
    }
}

/// Result type alias for treecast conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
