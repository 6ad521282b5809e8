//! Core collaborators for the Quartz object runtime.
//!
//! This crate provides the two external dependencies the shape graph borrows:
//! - Property-name interning (`intern`): stable, identity-comparable handles
//!   with process lifetime
//! - The value representation (`value`): an opaque 8-byte tagged value stored
//!   in object slots

pub mod intern;
pub mod value;

pub use value::Value;
