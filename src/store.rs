//! Word records and the read-only word-space store contract

use crate::error::{Result, WordSpaceError};
use crate::vector::Relation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Characters that make a token unusable as an exact-match word query.
const RESERVED_CHARS: &[char] = &['(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/'];

/// Characters that may not start a word query (query operators).
const RESERVED_PREFIXES: &[char] = &['+', '-', '!', '&', '|'];

/// A pair of parallel, space-delimited strings as kept by the store.
///
/// The n-th token of `words` belongs to the n-th token of `values`. Both
/// strings start with a delimiter, so their first token is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodedField {
    pub words: String,
    pub values: String,
}

impl EncodedField {
    pub fn new(words: impl Into<String>, values: impl Into<String>) -> Self {
        Self {
            words: words.into(),
            values: values.into(),
        }
    }
}

/// The stored data of one word: frequency, neighbors and collocations.
///
/// Neighbor similarities are stored without their leading `"0."`;
/// collocation significances are plain floats.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub frequency: u32,
    pub neighbors: EncodedField,
    pub collocations: [EncodedField; Relation::COUNT],
}

impl WordRecord {
    /// Create a record with empty neighbor and collocation fields
    pub fn new(word: impl Into<String>, frequency: u32) -> Self {
        Self {
            word: word.into(),
            frequency,
            ..Default::default()
        }
    }

    /// Set the encoded neighbor fields
    pub fn with_neighbors(mut self, words: impl Into<String>, values: impl Into<String>) -> Self {
        self.neighbors = EncodedField::new(words, values);
        self
    }

    /// Set the encoded collocation fields of one relation
    pub fn with_collocations(
        mut self,
        relation: Relation,
        words: impl Into<String>,
        values: impl Into<String>,
    ) -> Self {
        self.collocations[relation.slot()] = EncodedField::new(words, values);
        self
    }

    /// The encoded collocation fields of one relation
    pub fn collocation_field(&self, relation: Relation) -> &EncodedField {
        &self.collocations[relation.slot()]
    }
}

/// Reject tokens the store's exact-match query syntax cannot express.
pub fn validate_query(word: &str) -> Result<()> {
    let reason = if word.is_empty() {
        Some("empty query")
    } else if word.chars().any(char::is_whitespace) {
        Some("query must be a single token")
    } else if word.contains(RESERVED_CHARS) {
        Some("query contains reserved syntax")
    } else if word.starts_with(RESERVED_PREFIXES) {
        Some("query starts with an operator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(WordSpaceError::QueryParse {
            query: word.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// A read-only word space.
///
/// Records are addressed by a position in `0..count()` that is stable for
/// the lifetime of the handle. Implementations must allow concurrent reads.
pub trait WordSpaceStore: Send + Sync {
    /// Total number of records, readable or not.
    fn count(&self) -> usize;

    /// Read the record at `position`. Corrupt entries yield `MalformedRecord`.
    fn record_at(&self, position: usize) -> Result<WordRecord>;

    /// Exact, case-sensitive match on the word field without query validation.
    fn find(&self, word: &str) -> Result<Option<WordRecord>>;

    /// Exact, case-sensitive, single-token lookup.
    fn lookup_exact(&self, word: &str) -> Result<Option<WordRecord>> {
        validate_query(word)?;
        self.find(word)
    }

    /// Lazily read every record in position order.
    fn iterate_all(&self) -> RecordIter<'_, Self>
    where
        Self: Sized,
    {
        RecordIter {
            store: self,
            position: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Iterator over all records of a store, see [`WordSpaceStore::iterate_all`].
pub struct RecordIter<'a, S> {
    store: &'a S,
    position: usize,
}

impl<S: WordSpaceStore> Iterator for RecordIter<'_, S> {
    type Item = Result<WordRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.store.count() {
            return None;
        }
        let item = self.store.record_at(self.position);
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.count().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

/// In-memory word space.
#[derive(Debug, Default)]
pub struct MemoryWordSpace {
    records: Vec<WordRecord>,
    /// Word -> position in `records`
    positions: HashMap<String, usize>,
}

impl MemoryWordSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a word space from records, later duplicates replacing earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = WordRecord>) -> Self {
        let mut space = Self::new();
        for record in records {
            space.insert(record);
        }
        space
    }

    /// Add a record. A record for an existing word replaces it in place.
    pub fn insert(&mut self, record: WordRecord) {
        if let Some(&position) = self.positions.get(&record.word) {
            self.records[position] = record;
            return;
        }
        self.positions.insert(record.word.clone(), self.records.len());
        self.records.push(record);
    }

    pub fn records(&self) -> &[WordRecord] {
        &self.records
    }
}

impl WordSpaceStore for MemoryWordSpace {
    fn count(&self) -> usize {
        self.records.len()
    }

    fn record_at(&self, position: usize) -> Result<WordRecord> {
        self.records.get(position).cloned().ok_or_else(|| {
            WordSpaceError::malformed(
                format!("#{}", position),
                format!("position out of range (count={})", self.records.len()),
            )
        })
    }

    fn find(&self, word: &str) -> Result<Option<WordRecord>> {
        Ok(self
            .positions
            .get(word)
            .map(|&position| self.records[position].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(position: u8) -> Relation {
        Relation::new(position).unwrap()
    }

    #[test]
    fn test_record_builder() {
        let record = WordRecord::new("apple", 42)
            .with_neighbors(" pear", " 500")
            .with_collocations(rel(4), " tree", " 2.5");
        assert_eq!(record.frequency, 42);
        assert_eq!(record.neighbors.words, " pear");
        assert_eq!(record.collocation_field(rel(4)).values, " 2.5");
        assert_eq!(record.collocation_field(rel(1)).words, "");
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query("apple").is_ok());
        assert!(validate_query("Haus-tür").is_ok());
        for bad in ["", "two words", "a*", "title:x", "(x", "-x", "+x", "x\\y", "a/b"] {
            assert!(
                matches!(validate_query(bad), Err(WordSpaceError::QueryParse { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_lookup_exact_is_case_sensitive() {
        let store = MemoryWordSpace::from_records(vec![WordRecord::new("Apple", 3)]);
        assert!(store.lookup_exact("Apple").unwrap().is_some());
        assert!(store.lookup_exact("apple").unwrap().is_none());
    }

    #[test]
    fn test_lookup_exact_rejects_syntax() {
        let store = MemoryWordSpace::from_records(vec![WordRecord::new("a", 1)]);
        assert!(matches!(
            store.lookup_exact("a b"),
            Err(WordSpaceError::QueryParse { .. })
        ));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut store = MemoryWordSpace::new();
        store.insert(WordRecord::new("a", 1));
        store.insert(WordRecord::new("b", 2));
        store.insert(WordRecord::new("a", 7));
        assert_eq!(store.count(), 2);
        assert_eq!(store.record_at(0).unwrap().frequency, 7);
    }

    #[test]
    fn test_iterate_all_in_order() {
        let store = MemoryWordSpace::from_records(vec![
            WordRecord::new("x", 1),
            WordRecord::new("y", 2),
            WordRecord::new("z", 3),
        ]);
        let words: Vec<String> = store
            .iterate_all()
            .map(|r| r.unwrap().word)
            .collect();
        assert_eq!(words, vec!["x", "y", "z"]);
        assert_eq!(store.iterate_all().size_hint(), (3, Some(3)));
    }

    #[test]
    fn test_record_at_out_of_range() {
        let store = MemoryWordSpace::new();
        assert!(store.is_empty());
        assert!(matches!(
            store.record_at(0),
            Err(WordSpaceError::MalformedRecord { .. })
        ));
    }
}
