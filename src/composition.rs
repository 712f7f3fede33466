//! Phrase composition: tokenize, fetch per-token vectors, fold them with a
//! composition method, and compare the composed vectors.

use crate::algebra::{self, CompositionMethod};
use crate::error::{Result, WordSpaceError};
use crate::semantics::WordSpace;
use crate::similarity::{Similarity, SimilarityMeasure};
use crate::store::WordSpaceStore;
use crate::vector::SparseVector;
use tracing::debug;

/// A composed phrase vector, or the first token with no vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Composed {
    Vector(SparseVector),
    WordNotFound(String),
}

impl Composed {
    pub fn into_vector(self) -> Option<SparseVector> {
        match self {
            Composed::Vector(v) => Some(v),
            Composed::WordNotFound(_) => None,
        }
    }
}

/// Split a phrase into word tokens.
pub fn tokenize(phrase: &str) -> Vec<&str> {
    phrase.split_whitespace().collect()
}

impl<S: WordSpaceStore> WordSpace<S> {
    /// Compose a phrase into one vector using the configured feature space.
    ///
    /// A single-token phrase yields that token's vector unchanged; longer
    /// phrases are folded left to right.
    pub fn compose_phrase(&self, phrase: &str, method: &CompositionMethod) -> Result<Composed> {
        let tokens = tokenize(phrase);
        if tokens.is_empty() {
            return Err(WordSpaceError::InsufficientOperands { count: 0 });
        }

        let features = self.config().composition_features;
        let mut vectors = Vec::with_capacity(tokens.len());
        for token in &tokens {
            match self.collocation_vector(token, features)? {
                Some(v) => vectors.push(v),
                None => return Ok(Composed::WordNotFound(token.to_string())),
            }
        }

        if let [single] = vectors.as_slice() {
            return Ok(Composed::Vector(single.clone()));
        }
        debug!(tokens = tokens.len(), method = method.name(), "composing phrase");
        Ok(Composed::Vector(algebra::compose_many(&vectors, method)?))
    }

    /// Similarity of two phrases after composing each of them.
    pub fn compositional_similarity(
        &self,
        phrase1: &str,
        phrase2: &str,
        method: &CompositionMethod,
        measure: SimilarityMeasure,
    ) -> Result<Similarity> {
        let first = match self.compose_phrase(phrase1, method)? {
            Composed::Vector(v) => v,
            Composed::WordNotFound(token) => return Ok(Similarity::WordNotFound(token)),
        };
        let second = match self.compose_phrase(phrase2, method)? {
            Composed::Vector(v) => v,
            Composed::WordNotFound(token) => return Ok(Similarity::WordNotFound(token)),
        };
        Ok(measure.similarity(&first, &second))
    }

    /// Similarity of two single words' collocation vectors.
    pub fn semantic_similarity(&self, w1: &str, w2: &str, measure: SimilarityMeasure) -> Result<Similarity> {
        let features = self.config().composition_features;
        let Some(a) = self.collocation_vector(w1, features)? else {
            return Ok(Similarity::WordNotFound(w1.to_string()));
        };
        let Some(b) = self.collocation_vector(w2, features)? else {
            return Ok(Similarity::WordNotFound(w2.to_string()));
        };
        Ok(measure.similarity(&a, &b))
    }
}
