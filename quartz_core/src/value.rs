//! Tagged value representation.
//!
//! An 8-byte copyable value with the payload in the upper 61 bits and a tag
//! in the low 3. The shape graph treats values as opaque: it only ever moves
//! them between slots and fills fresh slots with `Value::none()`.

// =============================================================================
// Tags
// =============================================================================

const TAG_MASK: u64 = 0b111;
const TAG_NONE: u64 = 0b000;
const TAG_INT: u64 = 0b001;
const TAG_BOOL: u64 = 0b010;

/// Smallest integer representable without boxing.
pub const INT_MIN: i64 = -(1 << 60);
/// Largest integer representable without boxing.
pub const INT_MAX: i64 = (1 << 60) - 1;

// =============================================================================
// Value
// =============================================================================

/// An 8-byte tagged value (none / bool / int).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Value(u64);

impl Value {
    /// The `none` value.
    #[inline]
    pub const fn none() -> Self {
        Self(TAG_NONE)
    }

    /// A boolean value.
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Self(((b as u64) << 3) | TAG_BOOL)
    }

    /// An integer value, or `None` if it falls outside the 61-bit range.
    #[inline]
    pub fn int(v: i64) -> Option<Self> {
        if (INT_MIN..=INT_MAX).contains(&v) {
            Some(Self::int_unchecked(v))
        } else {
            None
        }
    }

    /// An integer value. The caller guarantees the 61-bit range.
    #[inline]
    pub fn int_unchecked(v: i64) -> Self {
        debug_assert!((INT_MIN..=INT_MAX).contains(&v));
        Self(((v as u64) << 3) | TAG_INT)
    }

    /// Whether this is the `none` value.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == TAG_NONE
    }

    /// Extract the integer payload, if this is an integer.
    #[inline]
    pub fn as_int(self) -> Option<i64> {
        if self.0 & TAG_MASK == TAG_INT {
            // Arithmetic shift restores the sign.
            Some((self.0 as i64) >> 3)
        } else {
            None
        }
    }

    /// Extract the boolean payload, if this is a boolean.
    #[inline]
    pub fn as_bool(self) -> Option<bool> {
        if self.0 & TAG_MASK == TAG_BOOL {
            Some(self.0 >> 3 != 0)
        } else {
            None
        }
    }

    /// Raw bit pattern.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl Default for Value {
    #[inline]
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "Value::none")
        } else if let Some(i) = self.as_int() {
            write!(f, "Value::int({i})")
        } else if let Some(b) = self.as_bool() {
            write!(f, "Value::bool({b})")
        } else {
            write!(f, "Value(raw={:#x})", self.0)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none() {
        let v = Value::none();
        assert!(v.is_none());
        assert_eq!(v.as_int(), None);
        assert_eq!(v.as_bool(), None);
    }

    #[test]
    fn test_int_round_trip() {
        for i in [0i64, 1, -1, 42, INT_MIN, INT_MAX] {
            let v = Value::int(i).unwrap();
            assert_eq!(v.as_int(), Some(i));
            assert!(!v.is_none());
        }
    }

    #[test]
    fn test_int_out_of_range() {
        assert!(Value::int(INT_MAX + 1).is_none());
        assert!(Value::int(INT_MIN - 1).is_none());
        assert!(Value::int(i64::MAX).is_none());
    }

    #[test]
    fn test_bool() {
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::bool(false).as_bool(), Some(false));
        assert!(!Value::bool(false).is_none());
    }

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<Value>(), 8);
    }
}
