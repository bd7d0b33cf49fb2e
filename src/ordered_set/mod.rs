//! Insertion-ordered set of `i32`.

mod store;
pub use store::{IntKeyStore, Keys};

use std::fmt;

use crate::error::{Error, Result};

/// A set of distinct integers that iterates in insertion order.
///
/// Every successful removal rebuilds the backing store from the surviving keys,
/// so the store never keeps holes. That makes removal O(n), keeps the relative
/// order of the survivors exact, and lets [`Self::get`] and [`Self::index_of`]
/// read ordinals straight from slot numbers.
#[derive(Clone, Default)]
pub struct OrderedIntSet {
    store: IntKeyStore,
}

impl OrderedIntSet {
    pub fn new() -> OrderedIntSet {
        OrderedIntSet {
            store: IntKeyStore::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> OrderedIntSet {
        OrderedIntSet {
            store: IntKeyStore::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, key: i32) -> bool {
        self.store.contains(key)
    }

    /// Append `key` if absent. Returns true if the set changed.
    pub fn add(&mut self, key: i32) -> bool {
        self.store.insert(key)
    }

    /// Add every key of `keys` in order. Returns true if any was new.
    pub fn add_all(&mut self, keys: &[i32]) -> bool {
        let mut changed = false;
        for &key in keys {
            changed |= self.store.insert(key);
        }
        changed
    }

    /// Remove `key` if present. Returns true if the set changed.
    pub fn remove(&mut self, key: i32) -> bool {
        if !self.store.remove(key) {
            return false;
        }
        self.rebuild();
        true
    }

    /// Remove every key of `keys`, rebuilding once. Returns true if any was present.
    pub fn remove_all(&mut self, keys: &[i32]) -> bool {
        let mut changed = false;
        for &key in keys {
            changed |= self.store.remove(key);
        }
        if changed {
            self.rebuild();
        }
        changed
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Element at ordinal `index`.
    pub fn get(&self, index: usize) -> Result<i32> {
        if index >= self.len() {
            return Err(Error::index_out_of_range(index, self.len()));
        }
        self.store
            .key_at(index)
            .ok_or_else(|| Error::index_out_of_range(index, self.len()))
    }

    /// Ordinal of `key`.
    pub fn index_of(&self, key: i32) -> Option<usize> {
        self.store.lookup(key)
    }

    pub fn iter(&self) -> Keys<'_> {
        self.store.keys()
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }

    /// Length of the longest prefix of `candidates` whose elements are all in the set.
    /// Scanning stops at the first miss.
    pub fn ordered_match_count(&self, candidates: &[i32]) -> usize {
        candidates
            .iter()
            .take_while(|&&key| self.contains(key))
            .count()
    }

    /// Length of the longest prefix of `candidates` that equals the set's own
    /// leading elements, position by position.
    pub fn ordered_start_match_count(&self, candidates: &[i32]) -> usize {
        candidates
            .iter()
            .zip(self.iter())
            .take_while(|&(&candidate, key)| candidate == key)
            .count()
    }

    /// Highest ordinal in `self` of any element of `other`.
    pub fn largest_index(&self, other: &OrderedIntSet) -> Option<usize> {
        other.iter().filter_map(|key| self.index_of(key)).max()
    }

    fn rebuild(&mut self) {
        let keys = self.to_vec();
        self.store.clear();
        for key in keys {
            self.store.insert(key);
        }
        debug_assert!(self.store.is_compact());
    }
}

impl fmt::Debug for OrderedIntSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Equal when both sets hold the same keys in the same order.
impl PartialEq for OrderedIntSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for OrderedIntSet {}

impl FromIterator<i32> for OrderedIntSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut set = OrderedIntSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<i32> for OrderedIntSet {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for key in iter {
            self.store.insert(key);
        }
    }
}

impl<'a> IntoIterator for &'a OrderedIntSet {
    type Item = i32;
    type IntoIter = Keys<'a>;

    fn into_iter(self) -> Keys<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut set = OrderedIntSet::new();
        assert!(set.add(7));
        assert_eq!(set.len(), 1);
        assert!(!set.add(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut set = OrderedIntSet::new();
        for key in [3, 1, 4, 1, 5, 9, 2, 6] {
            set.add(key);
        }
        assert_eq!(set.to_vec(), vec![3, 1, 4, 5, 9, 2, 6]);

        assert!(set.remove(4));
        assert_eq!(set.to_vec(), vec![3, 1, 5, 9, 2, 6]);
        assert!(!set.remove(4));

        // A new key goes to the end, not into the freed position.
        set.add(8);
        assert_eq!(set.to_vec(), vec![3, 1, 5, 9, 2, 6, 8]);
    }

    #[test]
    fn test_get() {
        let set: OrderedIntSet = [10, 20, 30].into_iter().collect();
        assert_eq!(set.get(0).unwrap(), 10);
        assert_eq!(set.get(2).unwrap(), 30);
        assert!(matches!(
            set.get(3),
            Err(Error::IndexOutOfRange { index: 3, size: 3 })
        ));
        assert!(OrderedIntSet::new().get(0).is_err());
    }

    #[test]
    fn test_get_after_remove() {
        let mut set: OrderedIntSet = (0..10).collect();
        set.remove(0);
        set.remove(5);
        assert_eq!(set.get(0).unwrap(), 1);
        assert_eq!(set.get(4).unwrap(), 6);
        assert_eq!(set.index_of(9), Some(7));
        assert_eq!(set.index_of(5), None);
    }

    #[test]
    fn test_ordered_match_count() {
        let set: OrderedIntSet = [3, 2, 1].into_iter().collect();
        assert_eq!(set.ordered_match_count(&[1, 2, 9, 3]), 2);
        assert_eq!(set.ordered_match_count(&[9, 1, 2]), 0);
        assert_eq!(set.ordered_match_count(&[]), 0);
        assert_eq!(set.ordered_match_count(&[3, 3, 1]), 3);
    }

    #[test]
    fn test_ordered_start_match_count() {
        let set: OrderedIntSet = [4, 5, 6].into_iter().collect();
        assert_eq!(set.ordered_start_match_count(&[4, 5, 7]), 2);
        assert_eq!(set.ordered_start_match_count(&[5, 4]), 0);
        assert_eq!(set.ordered_start_match_count(&[4, 5, 6, 7]), 3);
    }

    #[test]
    fn test_add_all_remove_all() {
        let mut set = OrderedIntSet::new();
        assert!(set.add_all(&[1, 2, 3, 4, 5]));
        assert!(!set.add_all(&[1, 2]));
        assert!(set.remove_all(&[2, 4, 42]));
        assert!(!set.remove_all(&[42]));
        assert_eq!(set.to_vec(), vec![1, 3, 5]);
    }

    #[test]
    fn test_largest_index() {
        let set: OrderedIntSet = [10, 20, 30, 40].into_iter().collect();
        let other: OrderedIntSet = [30, 10, 99].into_iter().collect();
        assert_eq!(set.largest_index(&other), Some(2));
        assert_eq!(set.largest_index(&OrderedIntSet::new()), None);
    }

    #[test]
    fn test_clear_and_equality() {
        let mut set: OrderedIntSet = [1, 2].into_iter().collect();
        let reversed: OrderedIntSet = [2, 1].into_iter().collect();
        assert_ne!(set, reversed);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set, OrderedIntSet::new());
        assert_eq!(format!("{:?}", reversed), "{2, 1}");
    }
}
