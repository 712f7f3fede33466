//! Similarity measures between sparse vectors

use crate::error::{Result, WordSpaceError};
use crate::vector::SparseVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Legacy code for a query word missing from the word space.
pub const NOT_FOUND_SENTINEL: f32 = -1.0;
/// Legacy code for a similarity that cannot be computed.
pub const UNDEFINED_SENTINEL: f32 = -2.0;

/// Similarity measures for comparing two sparse vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMeasure {
    /// Cosine of the angle between the vectors
    Cosine,
    /// Dice-style overlap (Kolb 2009), the default measure
    #[default]
    Dice,
}

impl SimilarityMeasure {
    /// Compute the similarity between two vectors using this measure
    pub fn similarity(&self, a: &SparseVector, b: &SparseVector) -> Similarity {
        match self {
            SimilarityMeasure::Cosine => cosine(a, b),
            SimilarityMeasure::Dice => dice(a, b),
        }
    }
}

impl FromStr for SimilarityMeasure {
    type Err = WordSpaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMeasure::Cosine),
            "dice" | "kolb" => Ok(SimilarityMeasure::Dice),
            _ => Err(WordSpaceError::UnsupportedMeasure(s.to_string())),
        }
    }
}

/// Outcome of a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub enum Similarity {
    Score(f32),
    /// A query word (or phrase token) is not in the word space
    WordNotFound(String),
    /// The measure is undefined for the inputs, e.g. cosine of an empty vector
    Undefined,
}

impl Similarity {
    /// The score, if one was computed
    pub fn score(&self) -> Option<f32> {
        match self {
            Similarity::Score(s) => Some(*s),
            _ => None,
        }
    }

    /// True only for a computed score strictly above zero
    pub fn is_positive(&self) -> bool {
        self.score().is_some_and(|s| s > 0.0)
    }

    /// Flatten into the legacy float encoding (`-1` not found, `-2` undefined).
    pub fn to_sentinel(&self) -> f32 {
        match self {
            Similarity::Score(s) => *s,
            Similarity::WordNotFound(_) => NOT_FOUND_SENTINEL,
            Similarity::Undefined => UNDEFINED_SENTINEL,
        }
    }

    fn from_ratio(numerator: f32, denominator: f32) -> Self {
        if denominator == 0.0 {
            Similarity::Undefined
        } else {
            Similarity::Score(numerator / denominator)
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Similarity::Score(s) => write!(f, "{}", s),
            Similarity::WordNotFound(w) => write!(f, "word not found: {}", w),
            Similarity::Undefined => write!(f, "undefined"),
        }
    }
}

/// Cosine similarity: dot product over shared keys divided by both norms.
///
/// Undefined when either vector has zero norm.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> Similarity {
    let norms = a.norm_squared() * b.norm_squared();
    if norms == 0.0 {
        return Similarity::Undefined;
    }
    let similarity = a.dot(b) / norms.sqrt();

    // Clamp to [-1, 1] to handle floating point errors
    Similarity::Score(similarity.clamp(-1.0, 1.0))
}

/// Dice-style similarity.
///
/// The numerator sums `a[k] + b[k]` over shared keys; the denominator is the
/// total weight of `a` plus the total weight of `b`.
pub fn dice(a: &SparseVector, b: &SparseVector) -> Similarity {
    let numerator: f32 = a
        .iter()
        .filter_map(|(key, x)| b.get(key).map(|y| x + y))
        .sum();
    Similarity::from_ratio(numerator, a.total() + b.total())
}

/// Weighted overlap of two feature lists, as used for word-to-word similarity.
///
/// The first list is indexed by key (a repeated key keeps its last weight)
/// and all its weights go into the denominator. Each entry of the second list
/// adds its weight to the denominator, and, when its key is indexed, its
/// weight plus the indexed weight to the numerator.
pub fn weighted_overlap<K, I, J>(first: I, second: J) -> Similarity
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, f32)>,
    J: IntoIterator<Item = (K, f32)>,
{
    let mut indexed = HashMap::new();
    let mut denominator = 0.0f32;
    for (key, value) in first {
        indexed.insert(key, value);
        denominator += value;
    }

    let mut numerator = 0.0f32;
    for (key, value) in second {
        if let Some(v1) = indexed.get(&key) {
            numerator += value + v1;
        }
        denominator += value;
    }
    Similarity::from_ratio(numerator, denominator)
}
