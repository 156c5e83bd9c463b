//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions.
//!
//! ```
//! use treecast::prelude::*;
//! ```

// Core types
pub use treecast_core::error::{Error as CoreError, Result as CoreResult};
pub use treecast_core::{ConvertOptions, EnumMember, EnumType, Map, Value};

// Schema types
pub use treecast_schema::{
    DeclaredType, FieldDef, Native, ParseError, Record, RecordType, SchemaError, TypeScope,
    parse_type,
};

// Codegen
pub use treecast_codegen::{BuildReport, CodegenError, compile, compile_all};
