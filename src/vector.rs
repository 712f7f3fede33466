//! Sparse word vectors and their feature keys

use crate::algebra;
use crate::error::{Result, WordSpaceError};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::{Add, Mul};

/// One of the six fixed corpus-window slots around a target word.
///
/// Positions 1-3 are the three slots to the left of the target word
/// (three, two and one word away), positions 4-6 the three slots to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation(u8);

impl Relation {
    /// Number of relation slots in a word record
    pub const COUNT: usize = 6;

    /// Create a relation from its 1-based position
    pub fn new(position: u8) -> Result<Self> {
        if (1..=Self::COUNT as u8).contains(&position) {
            Ok(Self(position))
        } else {
            Err(WordSpaceError::InvalidRelation(position))
        }
    }

    /// All six relations in position order
    pub fn all() -> impl Iterator<Item = Relation> {
        (1..=Self::COUNT as u8).map(Relation)
    }

    /// The 1-based position
    pub fn position(self) -> u8 {
        self.0
    }

    /// The 0-based slot index into a record's collocation fields
    pub fn slot(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a sparse vector entry.
///
/// Neighbor-set vectors and relation-aggregated collocation vectors are keyed
/// by the bare word; per-relation collocation vectors by word and relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKey {
    Word(String),
    Positional(String, Relation),
}

impl FeatureKey {
    /// The context word of this feature
    pub fn word(&self) -> &str {
        match self {
            FeatureKey::Word(w) | FeatureKey::Positional(w, _) => w,
        }
    }

    /// The relation of a positional feature
    pub fn relation(&self) -> Option<Relation> {
        match self {
            FeatureKey::Word(_) => None,
            FeatureKey::Positional(_, rel) => Some(*rel),
        }
    }
}

impl From<&str> for FeatureKey {
    fn from(word: &str) -> Self {
        FeatureKey::Word(word.to_string())
    }
}

impl From<(&str, Relation)> for FeatureKey {
    fn from((word, rel): (&str, Relation)) -> Self {
        FeatureKey::Positional(word.to_string(), rel)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Word(w) => write!(f, "{}", w),
            FeatureKey::Positional(w, rel) => write!(f, "{}_{}", w, rel),
        }
    }
}

/// A sparse vector mapping feature keys to 32-bit weights.
///
/// Keys are unique and only explicitly inserted entries exist. Iteration
/// follows key order, so results built from a vector are reproducible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SparseVector {
    entries: BTreeMap<FeatureKey, f32>,
}

impl SparseVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the vector has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight stored for `key`
    pub fn get(&self, key: &FeatureKey) -> Option<f32> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &FeatureKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Set the weight for `key`, returning the previous weight
    pub fn insert(&mut self, key: FeatureKey, value: f32) -> Option<f32> {
        self.entries.insert(key, value)
    }

    /// Add `value` to the weight for `key`, inserting it if absent
    pub fn accumulate(&mut self, key: FeatureKey, value: f32) {
        *self.entries.entry(key).or_insert(0.0) += value;
    }

    /// Iterate over `(key, weight)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureKey, f32)> {
        self.entries.iter().map(|(k, &v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> {
        self.entries.keys()
    }

    /// Sum of all weights
    pub fn total(&self) -> f32 {
        self.entries.values().sum()
    }

    /// Sum of squared weights
    pub fn norm_squared(&self) -> f32 {
        self.entries.values().map(|v| v * v).sum()
    }

    /// Compute the L2 norm (magnitude) of the vector
    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }

    /// Scalar dot product over the keys both vectors share
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .entries
            .iter()
            .filter_map(|(k, a)| large.entries.get(k).map(|b| a * b))
            .sum()
    }

    /// Create a copy with every weight multiplied by `scalar`
    pub fn scaled(&self, scalar: f32) -> SparseVector {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v * scalar))
            .collect()
    }
}

impl FromIterator<(FeatureKey, f32)> for SparseVector {
    fn from_iter<T: IntoIterator<Item = (FeatureKey, f32)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SparseVector {
    type Item = (FeatureKey, f32);
    type IntoIter = btree_map::IntoIter<FeatureKey, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Add for &SparseVector {
    type Output = SparseVector;

    fn add(self, other: &SparseVector) -> SparseVector {
        algebra::add(self, other)
    }
}

impl Mul for &SparseVector {
    type Output = SparseVector;

    /// Entry-wise product over shared keys
    fn mul(self, other: &SparseVector) -> SparseVector {
        algebra::multiply(self, other)
    }
}

impl Mul<f32> for &SparseVector {
    type Output = SparseVector;

    fn mul(self, scalar: f32) -> SparseVector {
        self.scaled(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn words(pairs: &[(&str, f32)]) -> SparseVector {
        pairs.iter().map(|&(w, v)| (FeatureKey::from(w), v)).collect()
    }

    #[test]
    fn test_relation_range() {
        assert!(Relation::new(0).is_err());
        assert!(Relation::new(7).is_err());
        let rel = Relation::new(6).unwrap();
        assert_eq!(rel.position(), 6);
        assert_eq!(rel.slot(), 5);
        assert_eq!(Relation::all().count(), 6);
    }

    #[test]
    fn test_feature_key_accessors() {
        let rel = Relation::new(2).unwrap();
        let key = FeatureKey::from(("cat", rel));
        assert_eq!(key.word(), "cat");
        assert_eq!(key.relation(), Some(rel));
        assert_eq!(key.to_string(), "cat_2");
        assert_eq!(FeatureKey::from("dog").relation(), None);
    }

    #[test]
    fn test_word_and_positional_keys_differ() {
        let mut v = SparseVector::new();
        v.insert(FeatureKey::from("cat"), 1.0);
        v.insert(FeatureKey::from(("cat", Relation::new(1).unwrap())), 2.0);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_accumulate() {
        let mut v = SparseVector::new();
        v.accumulate(FeatureKey::from("x"), 1.5);
        v.accumulate(FeatureKey::from("x"), 2.0);
        assert_relative_eq!(v.get(&FeatureKey::from("x")).unwrap(), 3.5);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_norm_and_total() {
        let v = words(&[("a", 3.0), ("b", 4.0)]);
        assert_relative_eq!(v.norm(), 5.0, epsilon = 1e-6);
        assert_relative_eq!(v.total(), 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dot_shared_keys_only() {
        let a = words(&[("x", 2.0), ("y", 3.0)]);
        let b = words(&[("y", 4.0), ("z", 5.0)]);
        assert_relative_eq!(a.dot(&b), 12.0, epsilon = 1e-6);
        assert_relative_eq!(b.dot(&a), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scaled_leaves_original() {
        let v = words(&[("x", 2.0)]);
        let s = &v * 0.5;
        assert_relative_eq!(s.get(&FeatureKey::from("x")).unwrap(), 1.0);
        assert_relative_eq!(v.get(&FeatureKey::from("x")).unwrap(), 2.0);
    }

    #[test]
    fn test_operator_sugar() {
        let a = words(&[("x", 1.0), ("y", 2.0)]);
        let b = words(&[("y", 3.0)]);
        assert_eq!((&a + &b).len(), 2);
        assert_eq!((&a * &b).len(), 1);
    }
}
