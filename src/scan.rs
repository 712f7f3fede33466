//! Brute-force corpus scan: score a query vector against every word.
//!
//! A scan decodes and scores every record in the store, so it costs
//! O(N · |vector|) and is by far the most expensive query. Records that fail
//! to read or decode are skipped and counted in the [`ScanReport`].
//! [`CorpusScan::similar_words_parallel`] spreads the per-record work over
//! the rayon thread pool and returns exactly what the sequential scan does.

use crate::algebra::CompositionMethod;
use crate::codec::{self, FeatureSpace};
use crate::composition::Composed;
use crate::config::ScanMode;
use crate::error::{Result, WordSpaceError};
use crate::semantics::WordSpace;
use crate::similarity::{Similarity, SimilarityMeasure};
use crate::store::WordSpaceStore;
use crate::vector::SparseVector;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A word with its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredWord {
    pub word: String,
    pub score: f32,
}

/// Result of a corpus scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Words with a strictly positive score, most similar first
    pub matches: Vec<ScoredWord>,
    /// Records scored successfully
    pub scanned: usize,
    /// Corrupt or undecodable records
    pub skipped: usize,
    pub elapsed: Duration,
}

enum Outcome {
    Scored(ScoredWord, Similarity),
    Skipped,
}

/// Nearest-neighbor search over a whole word space.
pub struct CorpusScan<'a, S> {
    store: &'a S,
    features: FeatureSpace,
}

impl<'a, S: WordSpaceStore> CorpusScan<'a, S> {
    /// Create a scan comparing against each record's vector in `features` shape.
    pub fn new(store: &'a S, features: FeatureSpace) -> Self {
        Self { store, features }
    }

    /// Score every record in store order on the calling thread.
    pub fn similar_words(&self, query: &SparseVector, measure: SimilarityMeasure) -> ScanReport {
        let start = Instant::now();
        let outcomes: Vec<Outcome> = (0..self.store.count())
            .map(|position| self.score_at(position, query, measure))
            .collect();
        self.finish(outcomes, start)
    }

    /// Score every record on the rayon pool.
    pub fn similar_words_parallel(&self, query: &SparseVector, measure: SimilarityMeasure) -> ScanReport {
        let start = Instant::now();
        // indexed collect keeps store order, so the stable sort below ties the same way
        let outcomes: Vec<Outcome> = (0..self.store.count())
            .into_par_iter()
            .map(|position| self.score_at(position, query, measure))
            .collect();
        self.finish(outcomes, start)
    }

    /// Run the scan in the given mode.
    pub fn run(&self, query: &SparseVector, measure: SimilarityMeasure, mode: ScanMode) -> ScanReport {
        match mode {
            ScanMode::Sequential => self.similar_words(query, measure),
            ScanMode::Parallel => self.similar_words_parallel(query, measure),
        }
    }

    fn score_at(&self, position: usize, query: &SparseVector, measure: SimilarityMeasure) -> Outcome {
        let decoded = self
            .store
            .record_at(position)
            .and_then(|record| Ok((codec::decode_vector(&record, self.features)?, record.word)));
        match decoded {
            Ok((vector, word)) => {
                let similarity = measure.similarity(query, &vector);
                let score = similarity.score().unwrap_or(0.0);
                Outcome::Scored(ScoredWord { word, score }, similarity)
            }
            Err(e) => {
                warn!(position, error = %e, "skipping defect record");
                Outcome::Skipped
            }
        }
    }

    fn finish(&self, outcomes: Vec<Outcome>, start: Instant) -> ScanReport {
        let mut matches = Vec::new();
        let mut scanned = 0;
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Outcome::Scored(scored, similarity) => {
                    scanned += 1;
                    if similarity.is_positive() {
                        matches.push(scored);
                    }
                }
                Outcome::Skipped => skipped += 1,
            }
        }
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));

        let elapsed = start.elapsed();
        info!(
            scanned,
            skipped,
            matches = matches.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "corpus scan finished"
        );
        ScanReport {
            matches,
            scanned,
            skipped,
            elapsed,
        }
    }
}

impl<S: WordSpaceStore> WordSpace<S> {
    /// A corpus scan over this word space using the configured feature space.
    pub fn corpus_scan(&self) -> CorpusScan<'_, S> {
        CorpusScan::new(self.store(), self.config().composition_features)
    }

    /// Words similar to `query`, scanned in the configured mode.
    pub fn similar_words_for_vector(&self, query: &SparseVector, measure: SimilarityMeasure) -> ScanReport {
        self.corpus_scan().run(query, measure, self.config().scan)
    }

    /// Compose a phrase and find the words most similar to it.
    ///
    /// Fails with `WordNotFound` naming the first token missing from the
    /// word space.
    pub fn similar_words_for_phrase(
        &self,
        phrase: &str,
        method: &CompositionMethod,
        measure: SimilarityMeasure,
    ) -> Result<ScanReport> {
        match self.compose_phrase(phrase, method)? {
            Composed::Vector(query) => Ok(self.similar_words_for_vector(&query, measure)),
            Composed::WordNotFound(word) => Err(WordSpaceError::WordNotFound { word }),
        }
    }
}
