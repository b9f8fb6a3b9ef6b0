//! Column identities.
//!
//! Every logical column of a query is identified by a small non-negative integer, a
//! [`ColumnId`]. The same id means the same column everywhere in one query, so sets of columns
//! are represented as bitsets of ids.
mod factory;
pub use factory::*;

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use bitvec::vec::BitVec;
use derive_more::{Display as DeriveDisplay, From, Into};
use itertools::Itertools;

use crate::scalar::ColumnRefOperator;

/// Identity of one logical column inside a query.
#[derive(
    Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, From, Into, DeriveDisplay,
)]
pub struct ColumnId(u32);

impl ColumnId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// An unordered set of column ids.
///
/// Equality and hashing only consider membership, so two sets built in different orders, or
/// with different spare capacity, are equal.
#[derive(Clone, Default)]
pub struct ColumnRefSet {
    bits: BitVec,
}

impl ColumnRefSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a ColumnRefOperator>,
    {
        columns.into_iter().map(|c| c.id()).collect()
    }

    pub fn insert(&mut self, id: ColumnId) {
        let idx = id.as_usize();
        if idx >= self.bits.len() {
            self.bits.resize(idx + 1, false);
        }
        self.bits.set(idx, true);
    }

    pub fn remove(&mut self, id: ColumnId) {
        let idx = id.as_usize();
        if idx < self.bits.len() {
            self.bits.set(idx, false);
        }
    }

    pub fn contains(&self, id: ColumnId) -> bool {
        self.bits.get(id.as_usize()).map_or(false, |bit| *bit)
    }

    /// Merges `other` into this set.
    pub fn union(&mut self, other: &ColumnRefSet) {
        if other.bits.len() > self.bits.len() {
            self.bits.resize(other.bits.len(), false);
        }
        for idx in other.bits.iter_ones() {
            self.bits.set(idx, true);
        }
    }

    pub fn union_ids<I: IntoIterator<Item = ColumnId>>(&mut self, ids: I) {
        self.extend(ids);
    }

    pub fn union_columns<'a, I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = &'a ColumnRefOperator>,
    {
        for column in columns {
            self.insert(column.id());
        }
    }

    /// Keeps only ids which are also in `other`.
    pub fn intersect(&mut self, other: &ColumnRefSet) {
        let removed = self
            .bits
            .iter_ones()
            .filter(|idx| !other.bits.get(*idx).map_or(false, |bit| *bit))
            .collect::<Vec<usize>>();
        for idx in removed {
            self.bits.set(idx, false);
        }
    }

    /// Removes all ids of `other`.
    pub fn except(&mut self, other: &ColumnRefSet) {
        let len = self.bits.len();
        for idx in other.bits.iter_ones().take_while(|idx| *idx < len) {
            self.bits.set(idx, false);
        }
    }

    pub fn is_subset_of(&self, other: &ColumnRefSet) -> bool {
        self.bits
            .iter_ones()
            .all(|idx| other.bits.get(idx).map_or(false, |bit| *bit))
    }

    pub fn is_intersect(&self, other: &ColumnRefSet) -> bool {
        self.bits
            .iter_ones()
            .any(|idx| other.bits.get(idx).map_or(false, |bit| *bit))
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Ids in ascending order. Calling it again restarts the sequence.
    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.bits.iter_ones().map(|idx| ColumnId(idx as u32))
    }

    pub fn to_vec(&self) -> Vec<ColumnId> {
        self.iter().collect()
    }
}

impl PartialEq for ColumnRefSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits.iter_ones().eq(other.bits.iter_ones())
    }
}

impl Eq for ColumnRefSet {}

impl Hash for ColumnRefSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for idx in self.bits.iter_ones() {
            idx.hash(state);
        }
    }
}

impl FromIterator<ColumnId> for ColumnRefSet {
    fn from_iter<T: IntoIterator<Item = ColumnId>>(iter: T) -> Self {
        let mut set = ColumnRefSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<ColumnId> for ColumnRefSet {
    fn extend<T: IntoIterator<Item = ColumnId>>(&mut self, iter: T) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl Display for ColumnRefSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

impl std::fmt::Debug for ColumnRefSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ColumnRefSet{}", self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use crate::column::{ColumnId, ColumnRefSet};

    fn set_of(ids: &[u32]) -> ColumnRefSet {
        ids.iter().map(|id| ColumnId::new(*id)).collect()
    }

    fn hash_of(set: &ColumnRefSet) -> u64 {
        let mut hasher = DefaultHasher::new();
        set.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_union_is_idempotent_and_commutative() {
        let a = set_of(&[1, 5, 9]);
        let b = set_of(&[2, 5, 70]);

        let mut ab = a.clone();
        ab.union(&b);
        let mut ba = b.clone();
        ba.union(&a);
        assert_eq!(ab, ba);

        let mut again = ab.clone();
        again.union(&b);
        assert_eq!(ab, again);
        assert_eq!(5, ab.len());
    }

    #[test]
    fn test_iter_is_ascending_and_restartable() {
        let set = set_of(&[64, 3, 0, 17]);
        let expected = vec![0, 3, 17, 64]
            .into_iter()
            .map(ColumnId::new)
            .collect::<Vec<_>>();

        assert_eq!(expected, set.iter().collect::<Vec<_>>());
        assert_eq!(expected, set.to_vec());
    }

    #[test]
    fn test_equality_ignores_capacity() {
        let mut a = set_of(&[1, 100]);
        a.remove(ColumnId::new(100));
        let b = set_of(&[1]);

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_set_operations() {
        let mut set = set_of(&[1, 2, 3, 4]);
        set.except(&set_of(&[2, 200]));
        assert_eq!(set_of(&[1, 3, 4]), set);

        set.intersect(&set_of(&[3, 4, 5]));
        assert_eq!(set_of(&[3, 4]), set);

        assert!(set.is_subset_of(&set_of(&[3, 4, 9])));
        assert!(!set.is_subset_of(&set_of(&[3])));
        assert!(set.is_intersect(&set_of(&[4])));
        assert!(!set.contains(ColumnId::new(1)));
        assert!(ColumnRefSet::new().is_empty());
        assert_eq!("{3, 4}", set.to_string());
    }
}
