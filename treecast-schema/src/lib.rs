//! # treecast Schema
//!
//! Record declarations, declared types and their structural classification.
//!
//! This crate provides:
//! - Record type declarations with validated fields and defaults
//! - Native field values and record instances
//! - The declared type model and a parser for annotation-like spellings
//! - Type classification driving routine generation

pub mod classify;
pub mod error;
pub mod native;
pub mod parser;
pub mod record;
pub mod types;
pub mod validation;

pub use classify::{ContainerKind, TypeShape, classify};
pub use error::{ParseError, SchemaError};
pub use native::{Native, NativePairs};
pub use parser::{TypeScope, parse_type};
pub use record::{DecodeRoutine, EncodeRoutine, FieldDef, Record, RecordType, RecordTypeBuilder};
pub use types::{DeclaredType, GenericKind, PrimitiveKind, TemporalKind};
pub use validation::{validate_enum, validate_fields};
