//! The shape graph and its object-side collaborators.
//!
//! # Architecture
//!
//! Objects with the same sequence of property definitions share a shape: an
//! immutable descriptor of "which names, at which slots, with which
//! attributes". Shapes form a transition graph rooted at the empty shape:
//!
//! ```text
//!     EmptyShape
//!         |
//!     +---+---+
//!     |       |
//!   "x"     "y"
//!     |       |
//!  Shape1  Shape2
//!     |
//!   "y"
//!     |
//!  Shape3 (has both x and y)
//! ```
//!
//! Adding, changing, or removing a property never mutates a shape in place;
//! it follows (or creates and memoizes) a transition edge to a successor
//! shape, so two objects performing the same mutation from the same shape
//! always converge on the same descriptor.
//!
//! ## Slots
//!
//! A shape assigns each property a slot index into the owning object's value
//! storage. Accessor properties occupy two consecutive slots (getter, then
//! setter); the companion slot carries no name. When a shape change inserts
//! or removes slots in the middle of the layout, the slot reshuffler moves
//! the object's stored values to match the new numbering.

pub mod attributes;
pub mod property_hash;
pub mod reshuffle;
pub mod shape;
pub mod shaped_object;
