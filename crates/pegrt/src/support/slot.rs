//! # Slot
//!
//! A structural "value not computed" marker.
//!
//! `Slot<V>` distinguishes *absent* (never computed) from an explicit
//! empty result: with `V = Option<U>`, `Slot::Filled(None)` means
//! "computed, and the answer is nothing", while `Slot::Absent` means the
//! computation has not run. Optional attributes in parse-result records
//! use this to make absence checkable without relying on the identity of
//! a sentinel object.

/// A value that may not have been computed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Slot<V> {
    /// No value has been stored. Distinct from any stored value,
    /// including `Filled(None)` when `V` is itself an `Option`.
    #[default]
    Absent,
    /// A stored value.
    Filled(V),
}

impl<V> Slot<V> {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn is_filled(&self) -> bool {
        matches!(self, Self::Filled(_))
    }

    /// Borrow the stored value, if any.
    #[must_use]
    pub const fn get(&self) -> Option<&V> {
        match self {
            Self::Absent => None,
            Self::Filled(value) => Some(value),
        }
    }

    /// Store a value, returning the previous one if the slot was filled.
    pub fn fill(&mut self, value: V) -> Option<V> {
        match std::mem::replace(self, Self::Filled(value)) {
            Self::Absent => None,
            Self::Filled(previous) => Some(previous),
        }
    }

    /// Take the stored value out, leaving the slot absent.
    pub fn take(&mut self) -> Option<V> {
        match std::mem::replace(self, Self::Absent) {
            Self::Absent => None,
            Self::Filled(value) => Some(value),
        }
    }

    /// Get the stored value, computing and storing it first if absent.
    pub fn get_or_insert_with<F>(&mut self, fill: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        if self.is_absent() {
            *self = Self::Filled(fill());
        }
        match self {
            Self::Filled(value) => value,
            // Just filled above.
            Self::Absent => unreachable!(),
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<V> {
        match self {
            Self::Absent => None,
            Self::Filled(value) => Some(value),
        }
    }
}

impl<V> From<V> for Slot<V> {
    fn from(value: V) -> Self {
        Self::Filled(value)
    }
}
