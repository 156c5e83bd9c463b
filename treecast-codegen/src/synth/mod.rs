//! Per-type conversion synthesis.
//!
//! Each declared type is turned into a composed closure once, at generation
//! time; running a routine only calls the closures.

pub mod decode;
pub mod encode;

pub use decode::{DecodeSynthesizer, ValueDecoder};
pub use encode::{EncodeSynthesizer, ValueEncoder};

use crate::error::CodegenError;
use std::sync::Arc;
use treecast_core::Error;
use treecast_schema::{ContainerKind, DeclaredType, TypeShape, classify};

/// Builds the encoder for a field's declared type.
///
/// # Errors
/// Returns `CodegenError` if the type has no conversion.
pub fn encoder(ctx: &FieldContext, ty: &DeclaredType) -> Result<ValueEncoder, CodegenError> {
    EncodeSynthesizer::new(ctx).synthesize(ty)
}

/// Builds the decoder for a field's declared type.
///
/// # Errors
/// Returns `CodegenError` if the type has no conversion.
pub fn decoder(ctx: &FieldContext, ty: &DeclaredType) -> Result<ValueDecoder, CodegenError> {
    DecodeSynthesizer::new(ctx).synthesize(ty)
}

/// The field a conversion is being synthesized for.
#[derive(Debug, Clone)]
pub struct FieldContext {
    /// Field name, shared by every closure built for the field.
    pub field: Arc<str>,
    /// Qualified name of the owning record type.
    pub record: String,
}

impl FieldContext {
    /// Creates a context for a field of a record.
    #[must_use]
    pub fn new(field: &str, record: impl Into<String>) -> Self {
        Self {
            field: Arc::from(field),
            record: record.into(),
        }
    }

    pub(crate) fn unsupported(&self, ty: &DeclaredType, hint: Option<&str>) -> CodegenError {
        CodegenError::UnsupportedField {
            field: self.field.to_string(),
            type_name: ty.to_string(),
            record: self.record.clone(),
            hint: hint.map(str::to_string),
        }
    }

    pub(crate) fn mismatch(&self, expected: &str, found: &str) -> Error {
        Error::mismatch(self.field.as_ref(), expected, found)
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::invalid_value(self.field.as_ref(), reason)
    }

    /// Rejects record types as mapping keys.
    pub(crate) fn check_key(&self, kind: ContainerKind, key: &DeclaredType) -> Result<(), CodegenError> {
        if !matches!(classify(key), TypeShape::Record(_)) {
            return Ok(());
        }
        let container = if kind == ContainerKind::ChainMap {
            "ChainMaps"
        } else {
            "Mappings"
        };
        Err(CodegenError::unsupported_data(format!(
            "{container} with records as keys are not supported (field \"{}\" in {})",
            self.field, self.record
        )))
    }

    /// Resolves the error for a declared type with no conversion.
    pub(crate) fn reject(&self, ty: &DeclaredType, shape: &TypeShape<'_>) -> CodegenError {
        match shape {
            TypeShape::Unparameterized { hint, .. } => self.unsupported(ty, Some(hint)),
            TypeShape::Unsupported { reason } => {
                tracing::debug!("field {} of {}: {}", self.field, self.record, reason);
                self.unsupported(ty, None)
            }
            _ => self.unsupported(ty, None),
        }
    }
}

/// Runs `attempt` for each alternative in order and returns the first
/// success. Shape errors move on to the next alternative; any other error is
/// returned as is.
pub(crate) fn first_match<T, A>(
    ctx: &FieldContext,
    type_name: &str,
    alternatives: &[A],
    mut attempt: impl FnMut(&A) -> treecast_core::Result<T>,
) -> treecast_core::Result<T> {
    for alternative in alternatives {
        match attempt(alternative) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_shape_error() => continue,
            Err(e) => return Err(e),
        }
    }
    Err(Error::NoMatchingVariant {
        field: ctx.field.to_string(),
        type_name: type_name.to_string(),
    })
}
