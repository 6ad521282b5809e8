//! A reference object built on the shape graph.
//!
//! `ShapedObject` stores property values in a fixed inline array plus a
//! growable overflow vector, with the layout described entirely by its
//! current shape. Every structural mutation (add, redefine, delete, seal)
//! steps the object to the successor shape and keeps the slots aligned via
//! the reshuffler.
//!
//! Accessor properties occupy two consecutive slots: getter at the
//! property's slot, setter in the unnamed companion slot right after it.

use quartz_core::Value;
use quartz_core::intern::InternedString;

use crate::object::attributes::PropertyAttributes;
use crate::object::reshuffle::{self, PropertySlots};
use crate::object::shape::{ShapeId, ShapeRegistry};

/// Inline slots reserved per object before spilling to the overflow vector.
pub const DEFAULT_INLINE_CAPACITY: usize = 4;

// =============================================================================
// Shaped Object
// =============================================================================

/// Property storage shaped by a [`ShapeRegistry`] shape.
#[derive(Debug)]
pub struct ShapedObject {
    shape: ShapeId,
    inline: Box<[Value]>,
    overflow: Vec<Value>,
    len: usize,
}

impl ShapedObject {
    /// Create an empty object with the default inline capacity.
    pub fn new(registry: &ShapeRegistry) -> Self {
        Self::with_inline_capacity(registry, DEFAULT_INLINE_CAPACITY)
    }

    /// Create an empty object with `capacity` inline slots.
    pub fn with_inline_capacity(registry: &ShapeRegistry, capacity: usize) -> Self {
        Self {
            shape: registry.empty_shape(),
            inline: vec![Value::none(); capacity].into_boxed_slice(),
            overflow: Vec::new(),
            len: 0,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Value of `key`, or `None` if absent. For accessors this is the
    /// getter; see [`accessor_pair`].
    ///
    /// [`accessor_pair`]: ShapedObject::accessor_pair
    pub fn get_property(&self, registry: &ShapeRegistry, key: &InternedString) -> Option<Value> {
        let slot = registry.find(self.shape, key)?;
        Some(self.slot(slot as usize))
    }

    /// Direct slot read for inline caches that have already validated the
    /// shape against [`ShapedObject::shape`].
    #[inline]
    pub fn get_property_cached(&self, slot: u32) -> Value {
        self.slot(slot as usize)
    }

    /// Getter and setter values of an accessor property.
    pub fn accessor_pair(
        &self,
        registry: &ShapeRegistry,
        key: &InternedString,
    ) -> Option<(Value, Value)> {
        let slot = registry.find(self.shape, key)?;
        if !registry.attrs_at(self.shape, slot).is_accessor() {
            return None;
        }
        Some((self.slot(slot as usize), self.slot(slot as usize + 1)))
    }

    /// Whether `key` is present.
    #[inline]
    pub fn has_property(&self, registry: &ShapeRegistry, key: &InternedString) -> bool {
        registry.find(self.shape, key).is_some()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Plain assignment. Writes an existing writable data property, or adds
    /// a new default data property when the object is extensible.
    ///
    /// Returns `false` when the write is rejected: read-only data property,
    /// accessor property (the embedder must invoke the setter), or a new
    /// key on a non-extensible object.
    pub fn set_property(
        &mut self,
        registry: &mut ShapeRegistry,
        key: &InternedString,
        value: Value,
    ) -> bool {
        if let Some(slot) = registry.find(self.shape, key) {
            let attrs = registry.attrs_at(self.shape, slot);
            if attrs.is_accessor() || !attrs.is_writable() {
                return false;
            }
            self.set_slot(slot as usize, value);
            return true;
        }
        if !registry.is_extensible(self.shape) {
            return false;
        }
        let (next, slot) = registry.add_member(self.shape, key, PropertyAttributes::data());
        self.resize_slots(registry.size(next) as usize);
        self.set_slot(slot as usize, value);
        self.shape = next;
        true
    }

    /// Define or redefine `key` as a data property with explicit attributes.
    ///
    /// A non-configurable property only accepts a redefinition with
    /// identical attributes, and only rewrites its value when writable. An
    /// accessor being redefined as data gives up its companion slot.
    pub fn define_property(
        &mut self,
        registry: &mut ShapeRegistry,
        key: &InternedString,
        value: Value,
        attrs: PropertyAttributes,
    ) -> bool {
        debug_assert!(!attrs.is_accessor());
        let attrs = attrs.resolved();
        if let Some(slot) = registry.find(self.shape, key) {
            let old_attrs = registry.attrs_at(self.shape, slot);
            if !old_attrs.is_configurable() {
                if attrs != old_attrs || !old_attrs.is_writable() {
                    return false;
                }
                self.set_slot(slot as usize, value);
                return true;
            }
            let was_accessor = old_attrs.is_accessor();
            let (next, slot) = registry.change_member(self.shape, key, attrs);
            if was_accessor {
                reshuffle::remove_slots(self, slot as usize + 1, 1);
            }
            self.shape = next;
            self.set_slot(slot as usize, value);
            return true;
        }
        if !registry.is_extensible(self.shape) {
            return false;
        }
        let (next, slot) = registry.add_member(self.shape, key, attrs);
        self.resize_slots(registry.size(next) as usize);
        self.set_slot(slot as usize, value);
        self.shape = next;
        true
    }

    /// Define or redefine `key` as an accessor pair.
    ///
    /// A data property being redefined as an accessor gains a companion
    /// slot; later slots renumber up and their values move with them.
    pub fn define_accessor(
        &mut self,
        registry: &mut ShapeRegistry,
        key: &InternedString,
        getter: Value,
        setter: Value,
        attrs: PropertyAttributes,
    ) -> bool {
        let attrs = (attrs | PropertyAttributes::ACCESSOR).resolved();
        if let Some(slot) = registry.find(self.shape, key) {
            let old_attrs = registry.attrs_at(self.shape, slot);
            if !old_attrs.is_configurable() {
                return false;
            }
            let was_data = !old_attrs.is_accessor();
            let (next, slot) = registry.change_member(self.shape, key, attrs);
            if was_data {
                reshuffle::insert_hole(self, slot as usize + 1);
            }
            self.shape = next;
            self.set_slot(slot as usize, getter);
            self.set_slot(slot as usize + 1, setter);
            return true;
        }
        if !registry.is_extensible(self.shape) {
            return false;
        }
        let (next, slot) = registry.add_member(self.shape, key, attrs);
        self.resize_slots(registry.size(next) as usize);
        self.set_slot(slot as usize, getter);
        self.set_slot(slot as usize + 1, setter);
        self.shape = next;
        true
    }

    /// Delete `key`. Absent keys delete vacuously; non-configurable
    /// properties refuse.
    pub fn delete_property(&mut self, registry: &mut ShapeRegistry, key: &InternedString) -> bool {
        let Some(slot) = registry.find(self.shape, key) else {
            return true;
        };
        let attrs = registry.attrs_at(self.shape, slot);
        if !attrs.is_configurable() {
            return false;
        }
        let count = if attrs.is_accessor() { 2 } else { 1 };
        let next = registry.remove_member(self.shape, key);
        reshuffle::remove_slots(self, slot as usize, count);
        self.shape = next;
        true
    }

    // =========================================================================
    // Integrity Levels
    // =========================================================================

    /// Forbid adding new properties. Existing slots keep their positions.
    pub fn prevent_extensions(&mut self, registry: &mut ShapeRegistry) {
        self.shape = registry.non_extensible(self.shape);
    }

    /// Seal: non-extensible, every property non-configurable. The slot
    /// layout is unchanged, so no values move.
    pub fn seal(&mut self, registry: &mut ShapeRegistry) {
        self.shape = registry.sealed(self.shape);
    }

    /// Freeze: sealed plus every data property read-only.
    pub fn freeze(&mut self, registry: &mut ShapeRegistry) {
        self.shape = registry.frozen(self.shape);
    }

    /// Current shape, usable as an inline-cache key together with
    /// [`ShapeId::raw`].
    #[inline]
    pub fn shape_id(&self) -> ShapeId {
        self.shape
    }
}

impl PropertySlots for ShapedObject {
    #[inline]
    fn inline_capacity(&self) -> usize {
        self.inline.len()
    }

    #[inline]
    fn shape(&self) -> ShapeId {
        self.shape
    }

    #[inline]
    fn set_shape(&mut self, shape: ShapeId) {
        self.shape = shape;
    }

    #[inline]
    fn slot(&self, index: usize) -> Value {
        debug_assert!(index < self.len);
        if index < self.inline.len() {
            self.inline[index]
        } else {
            self.overflow[index - self.inline.len()]
        }
    }

    #[inline]
    fn set_slot(&mut self, index: usize, value: Value) {
        debug_assert!(index < self.len);
        if index < self.inline.len() {
            self.inline[index] = value;
        } else {
            self.overflow[index - self.inline.len()] = value;
        }
    }

    #[inline]
    fn slot_len(&self) -> usize {
        self.len
    }

    fn resize_slots(&mut self, len: usize) {
        let overflow_len = len.saturating_sub(self.inline.len());
        self.overflow.resize(overflow_len, Value::none());
        if len < self.len {
            // Clear abandoned inline slots so stale values cannot leak into
            // a later property that reuses them.
            for slot in len..self.len.min(self.inline.len()) {
                self.inline[slot] = Value::none();
            }
        }
        self.len = len;
    }
}

// =============================================================================
// Tests
// =============================================================================
