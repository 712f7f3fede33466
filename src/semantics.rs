//! Word-level queries over a word space: frequency, collocations, neighbors,
//! first- and second-order similarity, and common context.

use crate::codec::{self, Collocation, FeatureSpace, Neighbor};
use crate::config::WordSpaceConfig;
use crate::error::{Result, WordSpaceError};
use crate::persistence::FileWordSpace;
use crate::similarity::{weighted_overlap, Similarity};
use crate::store::{WordRecord, WordSpaceStore};
use crate::vector::{Relation, SparseVector};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// A context feature shared by two words.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonFeature {
    pub word: String,
    /// Significance of the feature for the first word
    pub value_first: f32,
    /// Significance of the feature for the second word
    pub value_second: f32,
    pub relation: Relation,
}

impl CommonFeature {
    pub fn combined(&self) -> f32 {
        self.value_first + self.value_second
    }
}

/// Outcome of writing a word frequency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyListReport {
    pub written: usize,
    /// Corrupt entries that were left out
    pub skipped: usize,
}

/// Query facade over a read-only word space.
#[derive(Debug)]
pub struct WordSpace<S: WordSpaceStore> {
    store: S,
    config: WordSpaceConfig,
}

impl WordSpace<FileWordSpace> {
    /// Open a word-space directory using `config.load_into_memory`.
    pub fn open(dir: impl AsRef<Path>, config: WordSpaceConfig) -> Result<Self> {
        config.validate()?;
        let store = FileWordSpace::open(dir, config.load_into_memory)?;
        Ok(Self { store, config })
    }

    /// Release the word space and any in-memory copy of it.
    pub fn close(self) {
        self.store.close();
    }
}

impl<S: WordSpaceStore> WordSpace<S> {
    /// Wrap a store with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, WordSpaceConfig::default())
    }

    pub fn with_config(store: S, config: WordSpaceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &WordSpaceConfig {
        &self.config
    }

    /// Look up a word; a query the store cannot parse counts as not found.
    pub(crate) fn fetch(&self, word: &str) -> Result<Option<WordRecord>> {
        match self.store.lookup_exact(word) {
            Err(WordSpaceError::QueryParse { query, reason }) => {
                warn!(query = %query, reason = %reason, "unusable query word");
                Ok(None)
            }
            other => other,
        }
    }

    /// Corpus frequency of a word.
    pub fn frequency(&self, word: &str) -> Result<Option<u32>> {
        Ok(self.fetch(word)?.map(|record| record.frequency))
    }

    /// Number of words in the word space.
    pub fn number_of_words(&self) -> usize {
        self.store.count()
    }

    /// Distributionally similar words, most similar first.
    pub fn similar_words(&self, word: &str) -> Result<Option<Vec<Neighbor>>> {
        self.fetch(word)?
            .map(|record| codec::decode_neighbor_list(&record))
            .transpose()
    }

    /// Collocations summed over all relations, highest significance first.
    pub fn collocations(&self, word: &str) -> Result<Option<Vec<Collocation>>> {
        let Some(record) = self.fetch(word)? else {
            return Ok(None);
        };
        let mut summed: Vec<Collocation> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for c in codec::decode_collocations(&record)? {
            match seen.get(&c.word) {
                Some(&i) => summed[i].value += c.value,
                None => {
                    seen.insert(c.word.clone(), summed.len());
                    summed.push(Collocation {
                        relation: None,
                        ..c
                    });
                }
            }
        }
        sort_by_value(&mut summed);
        Ok(Some(summed))
    }

    /// Collocations with their relation, highest significance first.
    pub fn word_vector(&self, word: &str) -> Result<Option<Vec<Collocation>>> {
        let Some(record) = self.fetch(word)? else {
            return Ok(None);
        };
        let mut collocations = codec::decode_collocations(&record)?;
        sort_by_value(&mut collocations);
        Ok(Some(collocations))
    }

    /// A word's collocation vector in the given feature space.
    pub fn collocation_vector(&self, word: &str, space: FeatureSpace) -> Result<Option<SparseVector>> {
        self.fetch(word)?
            .map(|record| codec::decode_vector(&record, space))
            .transpose()
    }

    /// First-order similarity of two words from their collocation sets.
    ///
    /// Features are `(word, relation)` pairs. The result is capped at 1.0.
    pub fn first_order_similarity(&self, w1: &str, w2: &str) -> Result<Similarity> {
        let (Some(r1), Some(r2)) = (self.fetch(w1)?, self.fetch(w2)?) else {
            return Ok(not_found(&[w1, w2], self));
        };
        let features = |record: &WordRecord| -> Result<Vec<((String, Option<Relation>), f32)>> {
            Ok(codec::decode_collocations(record)?
                .into_iter()
                .map(|c| ((c.word, c.relation), c.value))
                .collect())
        };
        Ok(match weighted_overlap(features(&r1)?, features(&r2)?) {
            // accumulated rounding can push the ratio past 1
            Similarity::Score(s) => Similarity::Score(s.min(1.0)),
            other => other,
        })
    }

    /// Second-order similarity of two words from their neighbor sets.
    pub fn second_order_similarity(&self, w1: &str, w2: &str) -> Result<Similarity> {
        let (Some(r1), Some(r2)) = (self.fetch(w1)?, self.fetch(w2)?) else {
            return Ok(not_found(&[w1, w2], self));
        };
        let neighbors = |record: &WordRecord| -> Result<Vec<(String, f32)>> {
            Ok(codec::decode_neighbor_list(record)?
                .into_iter()
                .map(|n| (n.word, n.similarity))
                .collect())
        };
        Ok(weighted_overlap(neighbors(&r1)?, neighbors(&r2)?))
    }

    /// Features both words share at the same relation, ordered by the sum
    /// of their significances. `None` if either word is missing.
    pub fn common_context(&self, w1: &str, w2: &str) -> Result<Option<Vec<CommonFeature>>> {
        let Some(r1) = self.fetch(w1)? else {
            return Ok(None);
        };
        let Some(r2) = self.fetch(w2)? else {
            return Ok(None);
        };

        let first: HashMap<(String, Option<Relation>), f32> = codec::decode_collocations(&r1)?
            .into_iter()
            .map(|c| ((c.word, c.relation), c.value))
            .collect();

        let mut shared: Vec<CommonFeature> = codec::decode_collocations(&r2)?
            .into_iter()
            .filter_map(|c| {
                let relation = c.relation?;
                let value_first = *first.get(&(c.word.clone(), c.relation))?;
                Some(CommonFeature {
                    word: c.word,
                    value_first,
                    value_second: c.value,
                    relation,
                })
            })
            .collect();
        shared.sort_by(|a, b| b.combined().total_cmp(&a.combined()));
        Ok(Some(shared))
    }

    /// Write `word<TAB>frequency` for every readable word to `path`.
    pub fn word_frequency_list(&self, path: impl AsRef<Path>) -> Result<FrequencyListReport> {
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        let mut report = FrequencyListReport {
            written: 0,
            skipped: 0,
        };
        for item in self.store.iterate_all() {
            match item {
                Ok(record) => {
                    writeln!(out, "{}\t{}", record.word, record.frequency)?;
                    report.written += 1;
                }
                Err(e) => {
                    warn!(error = %e, "skipping defect entry");
                    report.skipped += 1;
                }
            }
        }
        out.flush()?;
        info!(
            path = %path.as_ref().display(),
            written = report.written,
            skipped = report.skipped,
            "wrote frequency list"
        );
        Ok(report)
    }
}

/// Name the first missing word of a failed pair lookup.
fn not_found<S: WordSpaceStore>(words: &[&str], space: &WordSpace<S>) -> Similarity {
    let missing = words
        .iter()
        .find(|w| !matches!(space.fetch(w), Ok(Some(_))))
        .unwrap_or(&words[0]);
    Similarity::WordNotFound(missing.to_string())
}

/// Stable sort, highest value first.
fn sort_by_value(collocations: &mut [Collocation]) {
    collocations.sort_by(|a, b| b.value.total_cmp(&a.value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWordSpace;
    use crate::test_support::{fruit_space, rel};
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn space() -> WordSpace<MemoryWordSpace> {
        WordSpace::new(fruit_space())
    }

    #[test]
    fn test_frequency() {
        let ws = space();
        assert_eq!(ws.frequency("apple").unwrap(), Some(120));
        assert_eq!(ws.frequency("mango").unwrap(), None);
        assert_eq!(ws.frequency("a:b").unwrap(), None);
        assert_eq!(ws.number_of_words(), 5);
    }

    #[test]
    fn test_similar_words_keeps_store_order() {
        let neighbors = space().similar_words("apple").unwrap().unwrap();
        let words: Vec<&str> = neighbors.iter().map(|n| n.word.as_str()).collect();
        assert_eq!(words, vec!["pear", "banana"]);
        assert_relative_eq!(neighbors[0].similarity, 0.61, epsilon = 1e-6);
        assert!(space().similar_words("mango").unwrap().is_none());
    }

    #[test]
    fn test_collocations_summed_and_sorted() {
        let collocations = space().collocations("apple").unwrap().unwrap();
        let words: Vec<&str> = collocations.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["tree", "eat", "pie", "fresh"]);
        assert!(collocations.iter().all(|c| c.relation.is_none()));
    }

    #[test]
    fn test_collocations_sum_across_relations() {
        let ws = WordSpace::new(MemoryWordSpace::from_records(vec![WordRecord::new("w", 1)
            .with_collocations(rel(1), " x y", " 1.0 5.0")
            .with_collocations(rel(6), " x", " 3.0")]));
        let collocations = ws.collocations("w").unwrap().unwrap();
        assert_eq!(collocations[0].word, "y");
        assert_relative_eq!(collocations[1].value, 4.0);
    }

    #[test]
    fn test_word_vector_has_relations() {
        let vector = space().word_vector("apple").unwrap().unwrap();
        assert_eq!(vector.len(), 4);
        assert_eq!(vector[0].word, "tree");
        assert_eq!(vector[0].relation, Some(rel(4)));
    }

    #[test]
    fn test_first_order_similarity() {
        let sim = space().first_order_similarity("apple", "pear").unwrap();
        assert_relative_eq!(sim.score().unwrap(), 8.0 / 10.5, epsilon = 1e-6);
    }

    #[test]
    fn test_first_order_boundary_is_one() {
        let ws = WordSpace::new(MemoryWordSpace::from_records(vec![
            WordRecord::new("w1", 1).with_collocations(rel(1), " fruit", " 2.0"),
            WordRecord::new("w2", 1).with_collocations(rel(1), " fruit", " 3.0"),
        ]));
        assert_eq!(ws.first_order_similarity("w1", "w2").unwrap(), Similarity::Score(1.0));
    }

    #[test]
    fn test_first_order_relation_must_match() {
        let ws = WordSpace::new(MemoryWordSpace::from_records(vec![
            WordRecord::new("w1", 1).with_collocations(rel(1), " fruit", " 2.0"),
            WordRecord::new("w2", 1).with_collocations(rel(2), " fruit", " 3.0"),
        ]));
        assert_eq!(ws.first_order_similarity("w1", "w2").unwrap(), Similarity::Score(0.0));
    }

    #[test]
    fn test_first_order_missing_word() {
        let ws = space();
        let sim = ws.first_order_similarity("apple", "mango").unwrap();
        assert_eq!(sim, Similarity::WordNotFound("mango".to_string()));
        assert_eq!(sim.to_sentinel(), -1.0);
        let sim = ws.first_order_similarity("mango", "apple").unwrap();
        assert_eq!(sim.to_sentinel(), -1.0);
    }

    #[test]
    fn test_first_order_without_collocations_is_undefined() {
        let ws = space();
        assert_eq!(ws.first_order_similarity("void", "void").unwrap(), Similarity::Undefined);
    }

    #[test]
    fn test_second_order_similarity() {
        let ws = WordSpace::new(MemoryWordSpace::from_records(vec![
            WordRecord::new("w1", 1).with_neighbors(" a b", " 5 25"),
            WordRecord::new("w2", 1).with_neighbors(" b c", " 75 5"),
        ]));
        // (0.75 + 0.25) / (0.75 + 1.25)
        let sim = ws.second_order_similarity("w1", "w2").unwrap();
        assert_relative_eq!(sim.score().unwrap(), 0.5, epsilon = 1e-6);
        assert_eq!(
            ws.second_order_similarity("w1", "w9").unwrap(),
            Similarity::WordNotFound("w9".to_string())
        );
    }

    #[test]
    fn test_malformed_requested_word_is_error() {
        let ws = WordSpace::new(MemoryWordSpace::from_records(vec![
            WordRecord::new("ok", 1).with_collocations(rel(1), " a", " 1.0"),
            WordRecord::new("bad", 1).with_collocations(rel(1), " a b", " 1.0"),
        ]));
        assert!(matches!(
            ws.first_order_similarity("ok", "bad"),
            Err(WordSpaceError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_common_context() {
        let shared = space().common_context("apple", "pear").unwrap().unwrap();
        assert_eq!(shared.len(), 2);
        assert_eq!(shared[0].word, "tree");
        assert_eq!(shared[0].relation, rel(4));
        assert_relative_eq!(shared[0].value_first, 3.0);
        assert_relative_eq!(shared[0].value_second, 2.0);
        assert_eq!(shared[1].word, "eat");
    }

    #[test]
    fn test_common_context_missing_vs_disjoint() {
        let ws = space();
        assert!(ws.common_context("mango", "apple").unwrap().is_none());
        assert!(ws.common_context("apple", "mango").unwrap().is_none());
        let disjoint = ws.common_context("apple", "stone").unwrap();
        assert_eq!(disjoint, Some(Vec::new()));
    }

    #[test]
    fn test_word_frequency_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("freq.txt");
        let report = space().word_frequency_list(&path).unwrap();
        assert_eq!(report, FrequencyListReport { written: 5, skipped: 0 });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "apple\t120");
    }
}
