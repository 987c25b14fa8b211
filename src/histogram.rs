//! A counted multiset.
//!
//! Formulas, valence and hybridization tallies, ring sizes and ring words are
//! all [`Histogram`]s, as are the changes computed across a reaction (which
//! may hold negative counts). Keys with a zero count are never stored.

use std::{
    collections::{btree_map, BTreeMap},
    fmt::{Debug, Display},
};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Histogram<K: Ord> {
    counts: BTreeMap<K, i64>,
}

impl<K: Ord> Default for Histogram<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Histogram<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from explicit `(key, count)` pairs.
    pub fn from_counts(counts: impl IntoIterator<Item = (K, i64)>) -> Self {
        let mut h = Self::new();
        for (k, n) in counts {
            h.add_n(k, n);
        }
        h
    }

    /// Count one more occurrence of `key`.
    pub fn add(&mut self, key: K) {
        self.add_n(key, 1);
    }

    /// Add `n` (possibly negative) occurrences of `key`, dropping the key if
    /// its count reaches zero.
    pub fn add_n(&mut self, key: K, n: i64) {
        if n == 0 {
            return;
        }
        match self.counts.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(n);
            }
            btree_map::Entry::Occupied(mut slot) => {
                *slot.get_mut() += n;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
        }
    }

    /// Return the count of `key`, zero if absent.
    pub fn get(&self, key: &K) -> i64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> i64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.counts.keys()
    }

    /// Return `true` iff every `(key, count)` entry of `other` appears in
    /// `self` with exactly the same count.
    pub fn contains_all(&self, other: &Self) -> bool {
        other.iter().all(|(k, v)| self.get(k) == v)
    }

    /// Replace every count by its absolute value.
    pub fn abs(mut self) -> Self {
        for v in self.counts.values_mut() {
            *v = v.abs();
        }
        self
    }
}

impl<K: Ord + Clone> Histogram<K> {
    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            self.add_n(k.clone(), v);
        }
    }

    /// Return `self - other`, key by key.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.add_n(k.clone(), -v);
        }
        out
    }
}

impl<K: Ord> FromIterator<K> for Histogram<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut h = Self::new();
        h.extend(iter);
        h
    }
}

impl<K: Ord> Extend<K> for Histogram<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for k in iter {
            self.add(k);
        }
    }
}

impl<K: Ord + Debug> Debug for Histogram<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.counts.iter()).finish()
    }
}

impl<K: Ord + Display> Display for Histogram<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (k, v)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}
