//! Shape graph (hidden classes) for dynamic-language object runtimes.
//!
//! This crate provides:
//! - Immutable, shareable shape descriptors with memoized transition edges
//! - Open-addressing property tables with copy-on-grow sharing
//! - The slot reshuffler keeping object storage aligned with shape changes
//! - A reference shaped object with inline + overflow slot storage
//! - Sealed/frozen shape variants and whole-graph teardown

#![deny(unsafe_op_in_unsafe_fn)]

pub mod object;

// Re-export commonly used items
pub use object::attributes::PropertyAttributes;
pub use object::reshuffle::{PropertySlots, insert_hole, remove_slots};
pub use object::shape::{ShapeId, ShapeRegistry, ShapeStats};
pub use object::shaped_object::ShapedObject;
