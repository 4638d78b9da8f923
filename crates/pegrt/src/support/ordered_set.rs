//! # Ordered Set
//!
//! Insertion-ordered unique collection with set algebra.
//!
//! The engine accumulates expected-token descriptions in an `OrderedSet`
//! so that "no alternative matched" messages list expectations in grammar
//! source order, deterministically. Generated grammars also use it for
//! FIRST/FOLLOW-style token-set arithmetic.
//!
//! Equality is defined by membership only (order-independent) even though
//! iteration preserves insertion order; do not use `==` where order
//! matters.

use indexmap::IndexSet;
use std::fmt::{self, Write};
use std::hash::Hash;

/// An insertion-ordered set.
#[derive(Clone)]
pub struct OrderedSet<T> {
    inner: IndexSet<T, ahash::RandomState>,
}

impl<T: Hash + Eq> OrderedSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: IndexSet::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Insert a value, returning whether it was newly added. Re-inserting
    /// an existing value never changes its position.
    pub fn insert(&mut self, value: T) -> bool {
        self.inner.insert(value)
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }

    /// Values of `self` in order, then values unique to `other` in order.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        self.inner.union(&other.inner).cloned().collect()
    }

    /// Values of `self`, in order, that are also in `other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        self.inner.intersection(&other.inner).cloned().collect()
    }

    /// Values of `self`, in order, that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        self.inner.difference(&other.inner).cloned().collect()
    }

    /// Values unique to `self` in order, then values unique to `other`.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self
    where
        T: Clone,
    {
        self.inner
            .symmetric_difference(&other.inner)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }

    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.inner.is_superset(&other.inner)
    }

    /// Join the elements in insertion order with a separator.
    #[must_use]
    pub fn join(&self, separator: &str) -> String
    where
        T: fmt::Display,
    {
        let mut out = String::new();
        for (index, value) in self.inner.iter().enumerate() {
            if index > 0 {
                out.push_str(separator);
            }
            let _ = write!(out, "{value}");
        }
        out
    }
}

impl<T: Hash + Eq> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> PartialEq for OrderedSet<T> {
    /// Membership-only equality; insertion order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Hash + Eq> Eq for OrderedSet<T> {}

impl<T: fmt::Debug> fmt::Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.iter()).finish()
    }
}

impl<T: Hash + Eq> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Hash + Eq> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl<T: Hash + Eq> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> OrderedSet<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut s = OrderedSet::new();
        s.insert("b");
        s.insert("a");
        s.insert("b");
        s.insert("c");
        let order: Vec<_> = s.iter().copied().collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(set(&["a", "b"]), set(&["b", "a"]));
        assert_ne!(set(&["a", "b"]), set(&["a"]));
    }

    #[test]
    fn test_union_order() {
        let u = set(&["b", "a"]).union(&set(&["c", "a"]));
        let order: Vec<_> = u.iter().cloned().collect();
        assert_eq!(order, ["b", "a", "c"]);
    }

    #[test]
    fn test_algebra() {
        let left = set(&["a", "b", "c"]);
        let right = set(&["b", "d"]);
        assert_eq!(left.intersection(&right), set(&["b"]));
        assert_eq!(left.difference(&right), set(&["a", "c"]));
        assert_eq!(left.symmetric_difference(&right), set(&["a", "c", "d"]));
        assert!(set(&["b"]).is_subset(&left));
        assert!(left.is_superset(&set(&["a", "c"])));
    }

    #[test]
    fn test_join_in_insertion_order() {
        let s = set(&["digit", "letter"]);
        assert_eq!(s.join(", "), "digit, letter");
    }
}
