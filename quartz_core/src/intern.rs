//! Process-wide property-name interning.
//!
//! Property names are interned once and referenced by handle everywhere else.
//! Two `InternedString`s for the same text are always the same handle, so
//! equality is an id comparison rather than a string comparison, and the id
//! doubles as a precomputed hash value for the shape graph's property tables.
//!
//! Interned names live for the whole process; every shape referencing a name
//! is therefore guaranteed the name outlives it.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

// =============================================================================
// Interned String
// =============================================================================

#[derive(Debug)]
struct InternedData {
    id: u32,
    text: Box<str>,
}

/// Handle to an interned property name.
///
/// Cheap to clone, compares and hashes by interner id. Ordering is by id as
/// well (interning order), which gives the shape graph a total order over
/// keys without touching string data.
#[derive(Clone)]
pub struct InternedString(Arc<InternedData>);

impl InternedString {
    /// The interned text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    /// Stable id, unique per distinct text for the process lifetime.
    ///
    /// Usable directly as a hash value.
    #[inline]
    pub fn id(&self) -> u32 {
        self.0.id
    }
}

impl PartialEq for InternedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Ids are unique per text, so this is identity comparison.
        self.0.id == other.0.id
    }
}

impl Eq for InternedString {}

impl Hash for InternedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for InternedString {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternedString {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternedString({:?}#{})", self.as_str(), self.id())
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Interner
// =============================================================================

struct Interner {
    map: RwLock<FxHashMap<Box<str>, InternedString>>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
        }
    }

    fn intern(&self, name: &str) -> InternedString {
        if let Some(existing) = self.map.read().get(name) {
            return existing.clone();
        }
        let mut map = self.map.write();
        // Double-check under the write lock.
        if let Some(existing) = map.get(name) {
            return existing.clone();
        }
        let id = map.len() as u32;
        let interned = InternedString(Arc::new(InternedData {
            id,
            text: name.into(),
        }));
        map.insert(name.into(), interned.clone());
        interned
    }
}

/// Global interner instance.
static INTERNER: OnceLock<Interner> = OnceLock::new();

/// Intern a property name.
#[inline]
pub fn intern(name: &str) -> InternedString {
    INTERNER.get_or_init(Interner::new).intern(name)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_identity() {
        let a = intern("foo");
        let b = intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_intern_distinct() {
        let a = intern("alpha");
        let b = intern("beta");
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_as_str_round_trip() {
        let s = intern("property_name");
        assert_eq!(s.as_str(), "property_name");
    }

    #[test]
    fn test_empty_and_unicode_names() {
        let empty = intern("");
        assert_eq!(empty.as_str(), "");
        let unicode = intern("名前");
        assert_eq!(unicode.as_str(), "名前");
        assert_eq!(intern("名前"), unicode);
    }

    #[test]
    fn test_ordering_follows_interning() {
        let first = intern("ord_first_xyzzy");
        let second = intern("ord_second_xyzzy");
        // Freshly interned names get increasing ids.
        assert!(first < second || first.id() < second.id());
    }

    #[test]
    fn test_clone_is_same_handle() {
        let a = intern("cloneme");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }
}
