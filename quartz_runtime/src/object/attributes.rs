//! Property attributes.
//!
//! A small value type describing one property: writability, enumerability,
//! configurability, and whether the property is an accessor pair. Attributes
//! are always canonicalized via [`PropertyAttributes::resolved`] before being
//! stored, compared, or used as a transition key, so two logically identical
//! attribute sets transition identically.

bitflags::bitflags! {
    /// Property descriptor attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct PropertyAttributes: u8 {
        /// Property value can be changed.
        const WRITABLE = 1 << 0;
        /// Property appears in enumeration.
        const ENUMERABLE = 1 << 1;
        /// Property can be deleted or have attributes changed.
        const CONFIGURABLE = 1 << 2;
        /// Property is a getter/setter pair occupying two slots.
        const ACCESSOR = 1 << 3;
    }
}

impl Default for PropertyAttributes {
    /// Default data property: writable, enumerable, configurable.
    #[inline]
    fn default() -> Self {
        Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE
    }
}

impl PropertyAttributes {
    /// Standard data property attributes.
    #[inline]
    pub const fn data() -> Self {
        Self::WRITABLE
            .union(Self::ENUMERABLE)
            .union(Self::CONFIGURABLE)
    }

    /// Read-only data property attributes.
    #[inline]
    pub const fn read_only() -> Self {
        Self::ENUMERABLE.union(Self::CONFIGURABLE)
    }

    /// Standard accessor property attributes.
    #[inline]
    pub const fn accessor() -> Self {
        Self::ENUMERABLE.union(Self::CONFIGURABLE).union(Self::ACCESSOR)
    }

    /// Canonical form: an accessor property is never writable.
    ///
    /// Idempotent. Applied before every comparison, storage, and transition
    /// lookup.
    #[inline]
    pub fn resolved(self) -> Self {
        if self.contains(Self::ACCESSOR) {
            self - Self::WRITABLE
        } else {
            self
        }
    }

    /// Check if the property is writable.
    #[inline]
    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    /// Check if the property is enumerable.
    #[inline]
    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    /// Check if the property is configurable.
    #[inline]
    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }

    /// Check if the property is an accessor pair.
    #[inline]
    pub fn is_accessor(self) -> bool {
        self.contains(Self::ACCESSOR)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_data() {
        let attrs = PropertyAttributes::default();
        assert!(attrs.is_writable());
        assert!(attrs.is_enumerable());
        assert!(attrs.is_configurable());
        assert!(!attrs.is_accessor());
        assert_eq!(attrs, PropertyAttributes::data());
    }

    #[test]
    fn test_read_only() {
        let attrs = PropertyAttributes::read_only();
        assert!(!attrs.is_writable());
        assert!(attrs.is_enumerable());
        assert!(attrs.is_configurable());
    }

    #[test]
    fn test_resolved_clears_writable_on_accessor() {
        let raw = PropertyAttributes::WRITABLE
            | PropertyAttributes::ENUMERABLE
            | PropertyAttributes::ACCESSOR;
        let resolved = raw.resolved();
        assert!(!resolved.is_writable());
        assert!(resolved.is_accessor());
        assert!(resolved.is_enumerable());
    }

    #[test]
    fn test_resolved_idempotent() {
        let cases = [
            PropertyAttributes::data(),
            PropertyAttributes::read_only(),
            PropertyAttributes::accessor(),
            PropertyAttributes::WRITABLE | PropertyAttributes::ACCESSOR,
            PropertyAttributes::empty(),
        ];
        for attrs in cases {
            let once = attrs.resolved();
            assert_eq!(once, once.resolved());
        }
    }

    #[test]
    fn test_resolved_identical_inputs_compare_equal() {
        // Logically identical attribute sets must canonicalize to the same
        // bit pattern regardless of how they were spelled.
        let a = (PropertyAttributes::accessor() | PropertyAttributes::WRITABLE).resolved();
        let b = PropertyAttributes::accessor().resolved();
        assert_eq!(a, b);
    }
}
