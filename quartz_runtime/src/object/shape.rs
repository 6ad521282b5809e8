//! Shapes and the shape registry.
//!
//! A shape is an immutable descriptor of an object's property layout: the
//! ordered (key, attributes) slots, a hash index over them, and the
//! extensibility bit. Shapes are arena-allocated inside a [`ShapeRegistry`]
//! and addressed by [`ShapeId`]; all structural operations go through the
//! registry and either follow a memoized transition edge or create exactly
//! one new shape.
//!
//! The registry is single-threaded: one registry per engine instance, no
//! cross-instance sharing. Embedders running several engines shard by
//! instance rather than locking.

use quartz_core::intern::InternedString;
use smallvec::SmallVec;

use crate::object::attributes::PropertyAttributes;
use crate::object::property_hash::{PropertyHashStore, TableId};

// =============================================================================
// Shape ID
// =============================================================================

/// Handle to a shape in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ShapeId(u32);

impl ShapeId {
    /// The root shape: no properties, extensible.
    pub const EMPTY: Self = Self(0);

    /// Check if this is the empty shape.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw value, usable as an inline-cache key.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Rebuild a handle from [`raw`]. The value must have come from a shape
    /// in the same registry.
    ///
    /// [`raw`]: ShapeId::raw
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Transitions
// =============================================================================

/// Transition edge key.
///
/// Add edges are keyed by the canonical attribute bits and double as the
/// memo for attribute changes (an attribute change is "the shape where this
/// key has those attributes"). Remove and non-extensible edges get their own
/// variants instead of sentinel flag values, so they can never collide with
/// a legitimate attribute pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Transition {
    Add {
        key: InternedString,
        attrs: PropertyAttributes,
    },
    Remove {
        key: InternedString,
    },
    NonExtensible,
}

// =============================================================================
// Shape
// =============================================================================

/// One shape node. Immutable once published except for the memo fields
/// (transition edges, sealed/frozen variants) and the teardown flag.
#[derive(Debug)]
struct ShapeData {
    /// Hash index over the live slots. Possibly shared with ancestors.
    table: TableId,
    /// Slot -> key. `None` marks an accessor's companion slot.
    keys: Vec<Option<InternedString>>,
    /// Slot -> attributes, parallel to `keys`.
    attrs: Vec<PropertyAttributes>,
    /// Whether new properties may be added.
    extensible: bool,
    /// Sorted transition edges, binary-searched. Fan-out is typically tiny.
    transitions: SmallVec<[(Transition, ShapeId); 4]>,
    /// Memoized sealed variant.
    sealed_variant: Option<ShapeId>,
    /// Memoized frozen variant.
    frozen_variant: Option<ShapeId>,
    /// Set during graph teardown.
    destroyed: bool,
}

impl ShapeData {
    /// Slot count, accessor companions included.
    #[inline]
    fn size(&self) -> u32 {
        self.keys.len() as u32
    }
}

// =============================================================================
// Shape Registry
// =============================================================================

/// Registry statistics.
#[derive(Debug, Clone, Copy)]
pub struct ShapeStats {
    /// Total shapes in the arena, root included.
    pub shapes: usize,
    /// Total property hash tables, shared ones counted once.
    pub tables: usize,
}

/// Arena of shapes plus their property tables.
///
/// Owns the root (empty) shape and every shape derived from it. Shapes are
/// never freed individually; [`ShapeRegistry::teardown`] marks the whole
/// graph destroyed at engine shutdown.
#[derive(Debug)]
pub struct ShapeRegistry {
    shapes: Vec<ShapeData>,
    tables: PropertyHashStore,
}

impl ShapeRegistry {
    /// Create a registry containing only the empty root shape.
    pub fn new() -> Self {
        let mut tables = PropertyHashStore::new();
        let root_table = tables.allocate();
        let root = ShapeData {
            table: root_table,
            keys: Vec::new(),
            attrs: Vec::new(),
            extensible: true,
            transitions: SmallVec::new(),
            sealed_variant: None,
            frozen_variant: None,
            destroyed: false,
        };
        Self {
            shapes: vec![root],
            tables,
        }
    }

    /// The root shape every object starts from.
    #[inline]
    pub fn empty_shape(&self) -> ShapeId {
        ShapeId::EMPTY
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Slot count of `shape`, accessor companion slots included.
    #[inline]
    pub fn size(&self, shape: ShapeId) -> u32 {
        self.data(shape).size()
    }

    /// Whether properties may still be added to objects of `shape`.
    #[inline]
    pub fn is_extensible(&self, shape: ShapeId) -> bool {
        self.data(shape).extensible
    }

    /// Key stored at `slot`, or `None` for an accessor companion slot.
    #[inline]
    pub fn key_at(&self, shape: ShapeId, slot: u32) -> Option<&InternedString> {
        self.data(shape).keys[slot as usize].as_ref()
    }

    /// Attributes stored at `slot`.
    #[inline]
    pub fn attrs_at(&self, shape: ShapeId, slot: u32) -> PropertyAttributes {
        self.data(shape).attrs[slot as usize]
    }

    /// Whether `shape` has been marked destroyed by [`teardown`].
    ///
    /// [`teardown`]: ShapeRegistry::teardown
    #[inline]
    pub fn is_destroyed(&self, shape: ShapeId) -> bool {
        self.data(shape).destroyed
    }

    /// Iterate the live properties of `shape` in slot order.
    pub fn properties(
        &self,
        shape: ShapeId,
    ) -> impl Iterator<Item = (&InternedString, PropertyAttributes, u32)> + '_ {
        let data = self.data(shape);
        data.keys
            .iter()
            .zip(data.attrs.iter())
            .enumerate()
            .filter_map(|(slot, (key, attrs))| {
                key.as_ref().map(|k| (k, *attrs, slot as u32))
            })
    }

    /// Registry statistics.
    pub fn stats(&self) -> ShapeStats {
        ShapeStats {
            shapes: self.shapes.len(),
            tables: self.tables.len(),
        }
    }

    /// Total number of shapes, root included.
    #[inline]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Look up the slot of `key` in `shape`.
    ///
    /// A hash hit pointing past this shape's size belongs to a descendant
    /// that appended to the shared table; it is masked out here.
    pub fn find(&self, shape: ShapeId, key: &InternedString) -> Option<u32> {
        let data = self.data(shape);
        let slot = self.tables.get(data.table).lookup(key)?;
        if slot >= data.size() {
            return None;
        }
        debug_assert_eq!(
            data.keys[slot as usize].as_ref(),
            Some(key),
            "property hash desynchronized from shape layout"
        );
        Some(slot)
    }

    // =========================================================================
    // Transition Operations
    // =========================================================================

    /// Add property `key` with `attrs`, returning the successor shape and
    /// the property's slot.
    ///
    /// Delegates to [`change_member`] when the key already exists. Never
    /// fails: extensibility and language-level redefinition rules are the
    /// caller's responsibility.
    ///
    /// [`change_member`]: ShapeRegistry::change_member
    pub fn add_member(
        &mut self,
        shape: ShapeId,
        key: &InternedString,
        attrs: PropertyAttributes,
    ) -> (ShapeId, u32) {
        self.assert_alive(shape);
        let attrs = attrs.resolved();
        if self.find(shape, key).is_some() {
            return self.change_member(shape, key, attrs);
        }
        let slot = self.data(shape).size();
        let edge = Transition::Add {
            key: key.clone(),
            attrs,
        };
        if let Some(next) = self.transition_target(shape, &edge) {
            return (next, slot);
        }
        let next = self.derive_with_member(shape, key, attrs);
        self.record_transition(shape, edge, next);
        (next, slot)
    }

    /// Change the attributes of an existing property, returning the
    /// successor shape and the property's slot.
    ///
    /// When the resolved attributes already match, this is a guaranteed
    /// no-op returning the same shape. Otherwise the successor is a sibling
    /// rebuilt from the root with the substituted attributes, memoized on
    /// the same edge cache as additions. If the change converts between a
    /// data property and an accessor, the slot count changes and the caller
    /// must reshuffle the object's storage (the companion hole sits at
    /// `slot + 1`).
    pub fn change_member(
        &mut self,
        shape: ShapeId,
        key: &InternedString,
        attrs: PropertyAttributes,
    ) -> (ShapeId, u32) {
        self.assert_alive(shape);
        let attrs = attrs.resolved();
        let slot = self
            .find(shape, key)
            .expect("change_member: property not present in shape");
        if attrs == self.data(shape).attrs[slot as usize] {
            // No-op fast path: identical attributes never allocate.
            return (shape, slot);
        }
        let edge = Transition::Add {
            key: key.clone(),
            attrs,
        };
        if let Some(next) = self.transition_target(shape, &edge) {
            return (next, slot);
        }
        let next = self.rebuild(shape, Some((slot, attrs)), None);
        log::trace!(
            "rebuilt sibling shape {:?} -> {:?} for attribute change of {key}",
            shape,
            next
        );
        self.record_transition(shape, edge, next);
        (next, slot)
    }

    /// Remove property `key`, returning the successor shape.
    ///
    /// The successor is rebuilt omitting the key (and its companion slot
    /// for accessors); slots after it renumber down. The caller must remove
    /// the corresponding value slot(s) from the object's storage.
    pub fn remove_member(&mut self, shape: ShapeId, key: &InternedString) -> ShapeId {
        self.assert_alive(shape);
        let slot = self
            .find(shape, key)
            .expect("remove_member: property not present in shape");
        let edge = Transition::Remove { key: key.clone() };
        if let Some(next) = self.transition_target(shape, &edge) {
            return next;
        }
        let next = self.rebuild(shape, None, Some(slot));
        log::trace!(
            "rebuilt shape {:?} -> {:?} removing {key}",
            shape,
            next
        );
        self.record_transition(shape, edge, next);
        next
    }

    /// The non-extensible variant of `shape`: identical properties, no
    /// further additions allowed.
    pub fn non_extensible(&mut self, shape: ShapeId) -> ShapeId {
        self.assert_alive(shape);
        if !self.data(shape).extensible {
            return shape;
        }
        let edge = Transition::NonExtensible;
        if let Some(next) = self.transition_target(shape, &edge) {
            return next;
        }
        let source = self.data(shape);
        let clone = ShapeData {
            table: source.table,
            keys: source.keys.clone(),
            attrs: source.attrs.clone(),
            extensible: false,
            transitions: SmallVec::new(),
            sealed_variant: None,
            frozen_variant: None,
            destroyed: false,
        };
        let next = self.push_shape(clone);
        self.record_transition(shape, edge, next);
        next
    }

    /// The sealed variant of `shape`: every property non-configurable,
    /// non-extensible. Memoized; sealing a sealed shape is the identity.
    pub fn sealed(&mut self, shape: ShapeId) -> ShapeId {
        self.assert_alive(shape);
        if let Some(sealed) = self.data(shape).sealed_variant {
            return sealed;
        }
        let props = self.live_properties(shape);
        let mut sealed = ShapeId::EMPTY;
        for (key, attrs) in props {
            let attrs = attrs - PropertyAttributes::CONFIGURABLE;
            sealed = self.add_member(sealed, &key, attrs).0;
        }
        let sealed = self.non_extensible(sealed);
        self.shapes[shape.index()].sealed_variant = Some(sealed);
        self.shapes[sealed.index()].sealed_variant = Some(sealed);
        sealed
    }

    /// The frozen variant of `shape`: sealed, and every data property also
    /// non-writable. Memoized; `frozen(frozen(s)) == frozen(s)` and
    /// `sealed(frozen(s)) == frozen(s)`.
    pub fn frozen(&mut self, shape: ShapeId) -> ShapeId {
        self.assert_alive(shape);
        if let Some(frozen) = self.data(shape).frozen_variant {
            return frozen;
        }
        let props = self.live_properties(shape);
        let mut frozen = ShapeId::EMPTY;
        for (key, attrs) in props {
            let mut attrs = attrs - PropertyAttributes::CONFIGURABLE;
            if !attrs.is_accessor() {
                attrs -= PropertyAttributes::WRITABLE;
            }
            frozen = self.add_member(frozen, &key, attrs).0;
        }
        let frozen = self.non_extensible(frozen);
        self.shapes[shape.index()].frozen_variant = Some(frozen);
        self.shapes[frozen.index()].frozen_variant = Some(frozen);
        self.shapes[frozen.index()].sealed_variant = Some(frozen);
        frozen
    }

    /// Whether `shape` is sealed: non-extensible with no configurable
    /// properties.
    pub fn is_sealed(&self, shape: ShapeId) -> bool {
        !self.data(shape).extensible
            && self
                .properties(shape)
                .all(|(_, attrs, _)| !attrs.is_configurable())
    }

    /// Whether `shape` is frozen: sealed with no writable data properties.
    pub fn is_frozen(&self, shape: ShapeId) -> bool {
        !self.data(shape).extensible
            && self.properties(shape).all(|(_, attrs, _)| {
                !attrs.is_configurable() && (attrs.is_accessor() || !attrs.is_writable())
            })
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Mark every shape reachable from the root destroyed.
    ///
    /// Traversal is an explicit work stack — transition chains can be
    /// thousands of shapes deep, far past safe recursion depth. Marking is
    /// idempotent: a shape reachable through several parents' edges and
    /// sealed/frozen caches is visited once.
    pub fn teardown(&mut self) {
        let mut stack = vec![ShapeId::EMPTY];
        let mut destroyed = 0usize;
        while let Some(shape) = stack.pop() {
            {
                let data = &mut self.shapes[shape.index()];
                if data.destroyed {
                    continue;
                }
                data.destroyed = true;
            }
            destroyed += 1;
            let data = &self.shapes[shape.index()];
            if let Some(sealed) = data.sealed_variant {
                if sealed != shape {
                    stack.push(sealed);
                }
            }
            if let Some(frozen) = data.frozen_variant {
                if frozen != shape {
                    stack.push(frozen);
                }
            }
            for (_, target) in &data.transitions {
                stack.push(*target);
            }
        }
        log::debug!("shape graph teardown: {destroyed} shapes destroyed");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    #[inline]
    fn data(&self, shape: ShapeId) -> &ShapeData {
        &self.shapes[shape.index()]
    }

    #[inline]
    fn assert_alive(&self, shape: ShapeId) {
        debug_assert!(
            !self.data(shape).destroyed,
            "shape operation after graph teardown"
        );
    }

    fn push_shape(&mut self, data: ShapeData) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(data);
        id
    }

    /// Follow a memoized transition edge, if present.
    fn transition_target(&self, shape: ShapeId, edge: &Transition) -> Option<ShapeId> {
        let data = self.data(shape);
        let pos = data
            .transitions
            .binary_search_by(|(key, _)| key.cmp(edge))
            .ok()?;
        let target = data.transitions[pos].1;
        debug_assert!(
            !self.data(target).destroyed,
            "transition edge to destroyed shape"
        );
        Some(target)
    }

    /// Record a new transition edge. The edge must not already exist.
    fn record_transition(&mut self, shape: ShapeId, edge: Transition, target: ShapeId) {
        let data = &mut self.shapes[shape.index()];
        match data.transitions.binary_search_by(|(key, _)| key.cmp(&edge)) {
            Ok(_) => debug_assert!(false, "duplicate transition edge"),
            Err(pos) => data.transitions.insert(pos, (edge, target)),
        }
    }

    /// Derive a successor appending `key` at the end of `shape`'s layout.
    /// Accessors get their companion slot in the same step.
    fn derive_with_member(
        &mut self,
        shape: ShapeId,
        key: &InternedString,
        attrs: PropertyAttributes,
    ) -> ShapeId {
        let (mut keys, mut slot_attrs, extensible, table, old_size) = {
            let source = self.data(shape);
            (
                source.keys.clone(),
                source.attrs.clone(),
                source.extensible,
                source.table,
                source.size(),
            )
        };
        keys.push(Some(key.clone()));
        slot_attrs.push(attrs);
        let mut new_size = old_size + 1;
        if attrs.is_accessor() {
            keys.push(None);
            slot_attrs.push(PropertyAttributes::empty());
            new_size += 1;
        }
        let table = self.tables.insert(table, key, old_size, old_size, new_size);
        self.push_shape(ShapeData {
            table,
            keys,
            attrs: slot_attrs,
            extensible,
            transitions: SmallVec::new(),
            sealed_variant: None,
            frozen_variant: None,
            destroyed: false,
        })
    }

    /// Snapshot the live (key, attributes) pairs of `shape` in slot order.
    fn live_properties(&self, shape: ShapeId) -> Vec<(InternedString, PropertyAttributes)> {
        self.properties(shape)
            .map(|(key, attrs, _)| (key.clone(), attrs))
            .collect()
    }

    /// Replay `shape`'s properties onto the root, substituting attributes
    /// at `substitute.0` or omitting the slot `omit`. Extensibility is
    /// preserved.
    fn rebuild(
        &mut self,
        shape: ShapeId,
        substitute: Option<(u32, PropertyAttributes)>,
        omit: Option<u32>,
    ) -> ShapeId {
        let slots: Vec<(Option<InternedString>, PropertyAttributes)> = {
            let data = self.data(shape);
            data.keys
                .iter()
                .cloned()
                .zip(data.attrs.iter().copied())
                .collect()
        };
        let extensible = self.data(shape).extensible;
        let mut next = ShapeId::EMPTY;
        for (slot, (key, attrs)) in slots.into_iter().enumerate() {
            let slot = slot as u32;
            if omit == Some(slot) {
                continue;
            }
            // Companion slots are recreated by add_member.
            let Some(key) = key else { continue };
            let attrs = match substitute {
                Some((at, new_attrs)) if at == slot => new_attrs,
                _ => attrs,
            };
            next = self.add_member(next, &key, attrs).0;
        }
        if !extensible {
            next = self.non_extensible(next);
        }
        next
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
