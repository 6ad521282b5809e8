//! Slot reshuffling.
//!
//! Shape changes that insert or remove slots in the middle of a layout
//! (data-to-accessor conversion and back, property deletion) renumber every
//! later slot. The functions here move an object's stored values to match,
//! working over the [`PropertySlots`] abstraction so any storage split into
//! an inline region and an overflow region can participate.
//!
//! The inline/overflow boundary makes a naive `memmove` wrong: a value whose
//! slot number crosses the boundary has to physically move between the two
//! regions. Both directions are handled as three region-local moves — within
//! overflow, across the boundary, within inline.

use quartz_core::Value;

use crate::object::shape::ShapeId;

// =============================================================================
// Property Slots
// =============================================================================

/// Slot storage split into a fixed inline region and a growable overflow
/// region. Slots `0..inline_capacity()` live inline; the rest overflow.
pub trait PropertySlots {
    /// Number of inline slots. Fixed for the lifetime of the storage.
    fn inline_capacity(&self) -> usize;

    /// Shape currently describing this storage.
    fn shape(&self) -> ShapeId;

    /// Rebind the storage to a new shape.
    fn set_shape(&mut self, shape: ShapeId);

    /// Read slot `index`.
    fn slot(&self, index: usize) -> Value;

    /// Write slot `index`.
    fn set_slot(&mut self, index: usize, value: Value);

    /// Number of slots currently in use.
    fn slot_len(&self) -> usize;

    /// Grow or shrink the used slot count. New slots read as none.
    fn resize_slots(&mut self, len: usize);
}

// =============================================================================
// Reshuffling
// =============================================================================

/// Open a one-slot hole at `position`, shifting every slot at or after it up
/// by one. The hole is cleared to none.
///
/// Used when a data property becomes an accessor: the companion slot appears
/// at `position` and everything behind it renumbers up.
pub fn insert_hole<S: PropertySlots + ?Sized>(store: &mut S, position: usize) {
    let old_len = store.slot_len();
    debug_assert!(position <= old_len);
    let capacity = store.inline_capacity();
    store.resize_slots(old_len + 1);

    // Overflow region, back to front.
    let overflow_from = position.max(capacity);
    let mut i = old_len;
    while i > overflow_from {
        i -= 1;
        let value = store.slot(i);
        store.set_slot(i + 1, value);
    }

    if position < capacity {
        // Last inline slot spills across the boundary.
        if old_len >= capacity {
            let value = store.slot(capacity - 1);
            store.set_slot(capacity, value);
        }
        // Inline region, back to front.
        let end = if old_len >= capacity { capacity - 1 } else { old_len };
        let mut i = end;
        while i > position {
            let value = store.slot(i - 1);
            store.set_slot(i, value);
            i -= 1;
        }
    }

    store.set_slot(position, Value::none());
}

/// Close `count` slots starting at `position`, shifting every later slot
/// down and shrinking the storage.
///
/// `count` is 1 for a data property, 2 for an accessor pair (getter plus
/// companion). Values crossing the overflow boundary move into the freed
/// inline slots.
pub fn remove_slots<S: PropertySlots + ?Sized>(store: &mut S, position: usize, count: usize) {
    let old_len = store.slot_len();
    debug_assert!(count == 1 || count == 2);
    debug_assert!(position + count <= old_len);
    let capacity = store.inline_capacity();

    let mut dst = position;
    let mut src = position + count;

    // Inline to inline.
    while src < capacity && src < old_len && dst < capacity {
        let value = store.slot(src);
        store.set_slot(dst, value);
        dst += 1;
        src += 1;
    }
    // Overflow values falling into freed inline slots.
    while dst < capacity && src < old_len {
        let value = store.slot(src);
        store.set_slot(dst, value);
        dst += 1;
        src += 1;
    }
    // Overflow to overflow.
    while src < old_len {
        let value = store.slot(src);
        store.set_slot(dst, value);
        dst += 1;
        src += 1;
    }

    store.resize_slots(old_len - count);
}

// =============================================================================
// Tests
// =============================================================================
