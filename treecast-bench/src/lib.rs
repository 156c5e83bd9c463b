//! # treecast Bench
//!
//! Benchmarking fixtures for treecast performance testing.

pub mod fixture;

pub use fixture::{Fixture, order_fixture};
