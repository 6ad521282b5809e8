//! Open-addressing property tables.
//!
//! Each shape answers "does property K exist, and at which slot" through a
//! hash table mapping interned keys to slot indices. Tables are shared: a
//! shape derived by appending a property keeps referencing its ancestor's
//! table and appends its entry in place, as long as it extends the table's
//! frontier. Deriving from anywhere behind the frontier, or pushing the fill
//! factor past 50%, forks a private copy first — the ancestor and its other
//! descendants keep the old table untouched (copy-on-grow, never in-place
//! growth of a shared array).
//!
//! Entries are never deleted individually: property removal builds a new
//! shape from scratch, so tables only ever grow.

use quartz_core::intern::InternedString;

// =============================================================================
// Capacity
// =============================================================================

/// Deltas turning powers of two into nearby primes.
const PRIME_DELTAS: [u8; 24] = [
    0, 0, 1, 3, 1, 5, 3, 3, 1, 9, 7, 5, 3, 9, 25, 3, 1, 21, 3, 21, 7, 15, 9, 5,
];

/// Prime-ish capacity just above `1 << bits`.
#[inline]
fn prime_for_num_bits(bits: u32) -> usize {
    (1usize << bits) + PRIME_DELTAS[bits as usize] as usize
}

/// Starting size exponent for fresh tables.
const INITIAL_NUM_BITS: u32 = 3;

// =============================================================================
// Hash Table
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    key: InternedString,
    index: u32,
}

/// One backing table: linear probing, wrap-around, no tombstones.
#[derive(Debug)]
pub struct HashTable {
    entries: Box<[Option<Entry>]>,
    num_bits: u32,
    /// Number of stored entries.
    len: u32,
    /// Logical slot count of the newest shape whose entries this table
    /// holds. Only a shape sitting exactly at this frontier may append.
    chain_size: u32,
}

impl HashTable {
    fn with_bits(num_bits: u32) -> Self {
        let capacity = prime_for_num_bits(num_bits);
        Self {
            entries: vec![None; capacity].into_boxed_slice(),
            num_bits,
            len: 0,
            chain_size: 0,
        }
    }

    /// Look up the slot index recorded for `key`.
    ///
    /// The result may belong to a descendant shape that appended past the
    /// caller's size; callers mask indices beyond their own slot count.
    pub fn lookup(&self, key: &InternedString) -> Option<u32> {
        let capacity = self.entries.len();
        let mut bucket = key.id() as usize % capacity;
        loop {
            match &self.entries[bucket] {
                None => return None,
                Some(entry) if entry.key == *key => return Some(entry.index),
                Some(_) => bucket = (bucket + 1) % capacity,
            }
        }
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Append an entry. The caller has already ensured there is room and
    /// that `key` is not present.
    fn push(&mut self, key: InternedString, index: u32) {
        let capacity = self.entries.len();
        let mut bucket = key.id() as usize % capacity;
        while self.entries[bucket].is_some() {
            bucket = (bucket + 1) % capacity;
        }
        self.entries[bucket] = Some(Entry { key, index });
        self.len += 1;
    }

    /// Would appending one more entry exceed the 50% fill bound?
    #[inline]
    fn needs_grow(&self) -> bool {
        self.entries.len() <= ((self.len + 1) as usize) * 2
    }
}

// =============================================================================
// Table Store
// =============================================================================

/// Handle to a table in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u32);

impl TableId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of hash tables.
///
/// Tables are addressed by id and live until the whole store is dropped;
/// forking leaves the old table in place for the shapes still holding its
/// id. Holding tables behind ids (rather than shared pointers) keeps the
/// copy-on-write rule free of interior mutability: only the store's owner
/// can mutate, and only ever one table per operation.
#[derive(Debug, Default)]
pub struct PropertyHashStore {
    tables: Vec<HashTable>,
}

impl PropertyHashStore {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Allocate a fresh empty table.
    pub fn allocate(&mut self) -> TableId {
        let id = TableId(self.tables.len() as u32);
        self.tables.push(HashTable::with_bits(INITIAL_NUM_BITS));
        id
    }

    /// Borrow a table for lookups.
    #[inline]
    pub fn get(&self, id: TableId) -> &HashTable {
        &self.tables[id.index()]
    }

    /// Number of live tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the store holds no tables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Record `key -> slot` for a shape growing from `old_size` to
    /// `new_size` slots. Returns the table the derived shape must reference:
    /// the same id if the entry could be appended in place, or a private
    /// (possibly grown) copy.
    ///
    /// A fork copies only entries with `index < old_size` — entries appended
    /// by other descendants of the shared table belong to a different
    /// branch's future and are dropped.
    pub fn insert(
        &mut self,
        id: TableId,
        key: &InternedString,
        slot: u32,
        old_size: u32,
        new_size: u32,
    ) -> TableId {
        debug_assert!(slot >= old_size && slot < new_size);
        let table = &self.tables[id.index()];
        let diverged = table.chain_size != old_size;
        let grow = table.needs_grow();
        let id = if diverged || grow {
            self.fork(id, grow, old_size)
        } else {
            id
        };
        let table = &mut self.tables[id.index()];
        table.push(key.clone(), slot);
        table.chain_size = new_size;
        id
    }

    /// Copy the entries live at `logical_size` into a new table, one size
    /// class larger when `grow` is set.
    fn fork(&mut self, id: TableId, grow: bool, logical_size: u32) -> TableId {
        let source = &self.tables[id.index()];
        let num_bits = source.num_bits + grow as u32;
        log::trace!(
            "forking property table {:?} (grow={grow}, live<{logical_size}, {} entries)",
            id,
            source.len
        );
        let mut fresh = HashTable::with_bits(num_bits);
        for entry in source.entries.iter().flatten() {
            if entry.index < logical_size {
                fresh.push(entry.key.clone(), entry.index);
            }
        }
        fresh.chain_size = logical_size;
        let new_id = TableId(self.tables.len() as u32);
        self.tables.push(fresh);
        new_id
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_core::intern::intern;

    #[test]
    fn test_prime_capacities() {
        assert_eq!(prime_for_num_bits(3), 11);
        assert_eq!(prime_for_num_bits(4), 17);
        assert_eq!(prime_for_num_bits(6), 67);
    }

    #[test]
    fn test_lookup_miss_on_empty() {
        let mut store = PropertyHashStore::new();
        let t = store.allocate();
        assert_eq!(store.get(t).lookup(&intern("missing")), None);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = PropertyHashStore::new();
        let mut t = store.allocate();
        let a = intern("ph_a");
        let b = intern("ph_b");
        t = store.insert(t, &a, 0, 0, 1);
        t = store.insert(t, &b, 1, 1, 2);
        assert_eq!(store.get(t).lookup(&a), Some(0));
        assert_eq!(store.get(t).lookup(&b), Some(1));
        assert_eq!(store.get(t).lookup(&intern("ph_c")), None);
    }

    #[test]
    fn test_chain_appends_share_table() {
        let mut store = PropertyHashStore::new();
        let t0 = store.allocate();
        let t1 = store.insert(t0, &intern("ph_x"), 0, 0, 1);
        let t2 = store.insert(t1, &intern("ph_y"), 1, 1, 2);
        // Frontier appends reuse the same backing table.
        assert_eq!(t0, t1);
        assert_eq!(t1, t2);
    }

    #[test]
    fn test_sibling_insert_forks() {
        let mut store = PropertyHashStore::new();
        let t0 = store.allocate();
        let shared = store.insert(t0, &intern("ph_base"), 0, 0, 1);
        // First branch extends the frontier in place.
        let left = store.insert(shared, &intern("ph_left"), 1, 1, 2);
        assert_eq!(left, shared);
        // Second branch from the same ancestor must fork.
        let right = store.insert(shared, &intern("ph_right"), 1, 1, 2);
        assert_ne!(right, shared);
        // The fork dropped the other branch's entry.
        assert_eq!(store.get(right).lookup(&intern("ph_left")), None);
        assert_eq!(store.get(right).lookup(&intern("ph_right")), Some(1));
        assert_eq!(store.get(right).lookup(&intern("ph_base")), Some(0));
        // The shared table is untouched from the left branch's view.
        assert_eq!(store.get(left).lookup(&intern("ph_left")), Some(1));
        assert_eq!(store.get(left).lookup(&intern("ph_right")), None);
    }

    #[test]
    fn test_grow_keeps_fill_factor() {
        let mut store = PropertyHashStore::new();
        let mut t = store.allocate();
        for i in 0..40u32 {
            let key = intern(&format!("ph_grow_{i}"));
            t = store.insert(t, &key, i, i, i + 1);
        }
        let table = store.get(t);
        assert!(table.capacity() >= (table.len() as usize) * 2);
        for i in 0..40u32 {
            let key = intern(&format!("ph_grow_{i}"));
            assert_eq!(table.lookup(&key), Some(i));
        }
    }

    #[test]
    fn test_grow_drops_stale_branch_entries() {
        let mut store = PropertyHashStore::new();
        let mut t = store.allocate();
        let keep = intern("ph_keep");
        t = store.insert(t, &keep, 0, 0, 1);
        // Descendant appends beyond slot 0 on the shared table.
        let descendant = store.insert(t, &intern("ph_future"), 1, 1, 2);
        assert_eq!(descendant, t);
        // Growing from the slot-1 ancestor must not carry the future entry.
        let forked = store.insert(t, &intern("ph_other"), 1, 1, 2);
        assert_ne!(forked, t);
        assert_eq!(store.get(forked).lookup(&keep), Some(0));
        assert_eq!(store.get(forked).lookup(&intern("ph_future")), None);
    }

    #[test]
    fn test_accessor_padding_skips_entry() {
        // An accessor occupies two slots but records one table entry; the
        // next append starts from the post-padding frontier.
        let mut store = PropertyHashStore::new();
        let mut t = store.allocate();
        t = store.insert(t, &intern("ph_acc"), 0, 0, 2);
        let t2 = store.insert(t, &intern("ph_next"), 2, 2, 3);
        assert_eq!(t, t2);
        assert_eq!(store.get(t2).lookup(&intern("ph_acc")), Some(0));
        assert_eq!(store.get(t2).lookup(&intern("ph_next")), Some(2));
    }
}
