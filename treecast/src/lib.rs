//! # treecast
//!
//! Compile-once conversion routines between typed records and generic value
//! trees.
//!
//! A record type declares named, typed fields. Compiling it walks the
//! declared types once and installs an encode routine (record to generic
//! map) and a decode routine (generic map to record) built from composed
//! closures, so converting a value never inspects types again.
//!
//! ## Features
//!
//! - **Type-directed routines** - Containers, optionals, unions, nested
//!   records, enumerations and temporal values
//! - **Generation-time errors** - Unsupported field types are rejected when a
//!   record is compiled, never halfway through a conversion
//! - **Explicit policies** - `use_bytes` and `use_enum` flow through every
//!   nested record via [`ConvertOptions`](core::ConvertOptions)
//! - **Missing vs null** - Absent keys apply defaults or fail, explicit nulls
//!   always pass through
//!
//! ## Quick Start
//!
//! ```
//! use treecast::prelude::*;
//!
//! let point = RecordType::builder("geometry", "Point")
//!     .field("x", DeclaredType::INT)
//!     .field_with_default("y", DeclaredType::INT, 0)
//!     .build()?;
//! compile(&point)?;
//!
//! let p = Record::new(&point, [("x", Native::from(3))])?;
//! let value = p.to_value(&ConvertOptions::new())?;
//! assert_eq!(value.get("y"), Some(&Value::Int(0)));
//! assert_eq!(point.from_value(&value, &ConvertOptions::new())?, p);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Generic values, enumerations, options, byte armor, data errors
//! - [`schema`] - Record declarations, declared types, parsing, classification
//! - [`codegen`] - Routine synthesis, assembly and installation

pub mod prelude;

/// Generic values, enumerations and conversion options.
pub mod core {
    pub use treecast_core::*;
}

/// Record declarations and declared types.
pub mod schema {
    pub use treecast_schema::*;
}

/// Routine generation.
pub mod codegen {
    pub use treecast_codegen::*;
}

pub use treecast_codegen::{compile, compile_all};
