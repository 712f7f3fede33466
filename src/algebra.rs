//! Vector composition: addition, multiplication, weighted combination, dilation.
//!
//! All operations are pure and return a new vector. Combination and dilation
//! follow Mitchell & Lapata, "Vector-based Models of Semantic Composition"
//! (ACL 2008) and Mitchell, "Composition in Distributional Models of
//! Semantics" (PhD thesis, Edinburgh 2011), chapter 4.

use crate::error::{Result, WordSpaceError};
use crate::vector::SparseVector;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Weight of the first vector in a combined composition (verb-noun setting).
pub const DEFAULT_ALPHA: f32 = 0.95;
/// Weight of the second vector in a combined composition.
pub const DEFAULT_BETA: f32 = 0.0;
/// Weight of the multiplicative part of a combined composition.
pub const DEFAULT_GAMMA: f32 = 0.05;
/// Stretch factor of dilation.
pub const DEFAULT_LAMBDA: f32 = 2.0;

/// Weights `α, β, γ` of `α·a + β·b + γ·(a·b)`.
///
/// If any weight is unset all three fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedWeights {
    pub alpha: Option<f32>,
    pub beta: Option<f32>,
    pub gamma: Option<f32>,
}

impl CombinedWeights {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// The effective `(α, β, γ)`
    pub fn resolve(&self) -> (f32, f32, f32) {
        match (self.alpha, self.beta, self.gamma) {
            (Some(alpha), Some(beta), Some(gamma)) => (alpha, beta, gamma),
            _ => (DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_GAMMA),
        }
    }
}

/// How two word vectors are composed into one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMethod {
    #[default]
    Addition,
    Multiplication,
    Combined(CombinedWeights),
    /// Not symmetric: the first operand is stretched along the second.
    Dilation { lambda: Option<f32> },
}

impl CompositionMethod {
    /// Compose two vectors with this method
    pub fn compose(&self, a: &SparseVector, b: &SparseVector) -> SparseVector {
        match *self {
            CompositionMethod::Addition => add(a, b),
            CompositionMethod::Multiplication => multiply(a, b),
            CompositionMethod::Combined(weights) => {
                let (alpha, beta, gamma) = weights.resolve();
                combine(a, b, alpha, beta, gamma)
            }
            CompositionMethod::Dilation { lambda } => {
                dilate(a, b, lambda.unwrap_or(DEFAULT_LAMBDA))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompositionMethod::Addition => "addition",
            CompositionMethod::Multiplication => "multiplication",
            CompositionMethod::Combined(_) => "combined",
            CompositionMethod::Dilation { .. } => "dilation",
        }
    }
}

impl FromStr for CompositionMethod {
    type Err = WordSpaceError;

    /// Parse a method name; parameterized methods get default weights.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "addition" | "add" => Ok(CompositionMethod::Addition),
            "multiplication" | "mult" => Ok(CompositionMethod::Multiplication),
            "combined" => Ok(CompositionMethod::Combined(CombinedWeights::default())),
            "dilation" => Ok(CompositionMethod::Dilation { lambda: None }),
            _ => Err(WordSpaceError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Key-wise sum over the union of keys.
pub fn add(a: &SparseVector, b: &SparseVector) -> SparseVector {
    let mut result = a.clone();
    for (key, value) in b.iter() {
        result.accumulate(key.clone(), value);
    }
    result
}

/// Key-wise product over the intersection of keys.
pub fn multiply(a: &SparseVector, b: &SparseVector) -> SparseVector {
    a.iter()
        .filter_map(|(key, x)| b.get(key).map(|y| (key.clone(), x * y)))
        .collect()
}

/// `α·a + β·b + γ·(a·b)` with `a·b` the entry-wise product.
///
/// The result covers the union of keys, so keys weighted by zero remain
/// present with weight zero.
pub fn combine(a: &SparseVector, b: &SparseVector, alpha: f32, beta: f32, gamma: f32) -> SparseVector {
    let product = multiply(a, b).scaled(gamma);
    add(&add(&a.scaled(alpha), &b.scaled(beta)), &product)
}

/// Dilate `u` along `v`: `(u·u)v + (λ-1)(u·v)u` with scalar dot products.
pub fn dilate(u: &SparseVector, v: &SparseVector, lambda: f32) -> SparseVector {
    let uu = u.norm_squared();
    let uv = u.dot(v);
    add(&v.scaled(uu), &u.scaled((lambda - 1.0) * uv))
}

/// Fold two or more vectors left to right with `method`.
pub fn compose_many(vectors: &[SparseVector], method: &CompositionMethod) -> Result<SparseVector> {
    match vectors {
        [first, second, rest @ ..] => {
            let folded = method.compose(first, second);
            Ok(rest.iter().fold(folded, |acc, v| method.compose(&acc, v)))
        }
        _ => Err(WordSpaceError::InsufficientOperands {
            count: vectors.len(),
        }),
    }
}
