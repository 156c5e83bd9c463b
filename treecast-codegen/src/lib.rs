//! # treecast Codegen
//!
//! Generation of per-record conversion routines.
//!
//! This crate provides:
//! - Type-directed synthesis of encode and decode conversions
//! - Assembly of per-record routines with presence, default and null handling
//! - Installation of the routines on their record type
//! - Namespace tracking for build reports

pub mod builder;
pub mod error;
pub mod imports;
pub mod synth;

pub use builder::{BuildReport, RoutineBuilder, Slot};
pub use error::CodegenError;
pub use imports::NamespaceSet;

use std::sync::Arc;
use treecast_schema::RecordType;

/// Builds and installs the encode and decode routines of a record type.
///
/// Running it again replaces the previously installed routines.
///
/// # Errors
/// Returns `CodegenError` if a field's declared type has no conversion. In
/// that case no routine is installed.
pub fn compile(record: &Arc<RecordType>) -> Result<BuildReport, CodegenError> {
    RoutineBuilder::new(record).compile()
}

/// Compiles several record types in order, stopping at the first failure.
///
/// # Errors
/// Returns the first `CodegenError` encountered. Records compiled before it
/// keep their routines.
pub fn compile_all<'a, I>(records: I) -> Result<Vec<BuildReport>, CodegenError>
where
    I: IntoIterator<Item = &'a Arc<RecordType>>,
{
    records.into_iter().map(compile).collect()
}
