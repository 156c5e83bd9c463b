//! Error types for routine generation.

use thiserror::Error;

/// Error type for routine generation.
///
/// Raised while a record type's routines are being built; when one is
/// returned nothing has been installed for that record type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// Record declaration error.
    #[error("schema error: {0}")]
    Schema(#[from] treecast_schema::SchemaError),

    /// A field's declared type has no conversion.
    #[error("field \"{field}\" of type {type_name} in {record} is not serializable{}", hint_suffix(.hint))]
    UnsupportedField {
        /// Field name.
        field: String,
        /// Offending declared type.
        type_name: String,
        /// Qualified name of the owning record type.
        record: String,
        /// Suggested replacement spelling.
        hint: Option<String>,
    },

    /// A declared type is convertible in principle but the data layout it
    /// implies is not supported.
    #[error("unsupported data: {reason}")]
    UnsupportedData {
        /// Description of the problem.
        reason: String,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default()
}

impl CodegenError {
    /// Creates an unsupported data error.
    pub fn unsupported_data(reason: impl Into<String>) -> Self {
        Self::UnsupportedData {
            reason: reason.into(),
        }
    }

    /// Returns the hint of an unsupported field error.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::UnsupportedField { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_field_display() {
        let err = CodegenError::UnsupportedField {
            field: "items".to_string(),
            type_name: "list".to_string(),
            record: "shop.Order".to_string(),
            hint: Some("Use List[T] instead".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "field \"items\" of type list in shop.Order is not serializable: Use List[T] instead"
        );
        assert_eq!(err.hint(), Some("Use List[T] instead"));
    }

    #[test]
    fn test_unsupported_field_without_hint() {
        let err = CodegenError::UnsupportedField {
            field: "amount".to_string(),
            type_name: "decimal.Decimal".to_string(),
            record: "shop.Order".to_string(),
            hint: None,
        };
        assert_eq!(
            err.to_string(),
            "field \"amount\" of type decimal.Decimal in shop.Order is not serializable"
        );
        assert!(err.hint().is_none());
    }
}
