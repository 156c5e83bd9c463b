//! # treecast Core
//!
//! Core types shared by every treecast crate.
//!
//! This crate provides:
//! - The generic value tree ([`Value`], [`Map`]) records convert to and from
//! - Enumeration types and members
//! - Conversion options (`use_bytes`, `use_enum`)
//! - Base64 armor helpers for byte sequences
//! - Error types for conversion operations

pub mod armor;
pub mod enumeration;
pub mod error;
pub mod options;
pub mod value;
mod value_serde;

pub use armor::{decode_bytes, encode_bytes};
pub use enumeration::{EnumMember, EnumType, EnumVariant};
pub use error::{Error, Result};
pub use options::ConvertOptions;
pub use value::{Map, Value};
