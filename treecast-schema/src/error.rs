//! Error types for type spelling parsing and record declaration.

use thiserror::Error;

/// Error type for parsing a declared type spelling such as `List[int]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token appeared where another one was required.
    #[error("unexpected '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        /// Byte position of the token.
        position: usize,
        /// Token found.
        found: String,
        /// What the parser expected.
        expected: String,
    },

    /// Input ended before the type was complete.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// What the parser expected.
        expected: String,
    },

    /// A character that cannot start any token.
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter {
        /// Byte position of the character.
        position: usize,
        /// The offending character.
        character: char,
    },

    /// Type arguments were given to a type that takes none.
    #[error("type '{name}' is not subscriptable")]
    NotSubscriptable {
        /// Type name.
        name: String,
    },

    /// A special form received the wrong number of arguments.
    #[error("'{name}' takes {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Special form name.
        name: String,
        /// Expected count description.
        expected: String,
        /// Actual count.
        actual: usize,
    },
}

impl ParseError {
    /// Creates an unexpected token error.
    pub fn unexpected(position: usize, found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            position,
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Creates an unexpected end of input error.
    pub fn end(expected: impl Into<String>) -> Self {
        Self::UnexpectedEnd {
            expected: expected.into(),
        }
    }
}

/// Error type for record and enumeration declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A name that must not be empty is empty.
    #[error("empty {kind} name in '{owner}'")]
    EmptyName {
        /// Kind of name (field, member, type).
        kind: &'static str,
        /// Owning declaration.
        owner: String,
    },

    /// Two fields share a name.
    #[error("duplicate field '{field}' in record '{record}'")]
    DuplicateField {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
    },

    /// A field without a default follows a field with one.
    #[error("non-default field '{field}' follows a default field in record '{record}'")]
    RequiredAfterDefault {
        /// Record name.
        record: String,
        /// Field name.
        field: String,
    },

    /// Two enumeration members share a name.
    #[error("duplicate member '{member}' in enum '{enum_name}'")]
    DuplicateMember {
        /// Enumeration name.
        enum_name: String,
        /// Member name.
        member: String,
    },

    /// An enumeration member value is unusable.
    #[error("invalid value for member '{member}' of enum '{enum_name}': {reason}")]
    InvalidEnumValue {
        /// Enumeration name.
        enum_name: String,
        /// Member name.
        member: String,
        /// Description of the problem.
        reason: String,
    },

    /// A type name is registered twice in a scope.
    #[error("duplicate type definition: '{name}'")]
    DuplicateType {
        /// Qualified type name.
        name: String,
    },
}
