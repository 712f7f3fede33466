//! Decoding of a record's compact field strings into sparse vectors.
//!
//! Every encoded field is a pair of parallel strings split on single spaces.
//! The strings begin with a delimiter, so token 0 is an empty artifact and
//! decoding starts at token 1. Trailing empty tokens are ignored.

use crate::error::{Result, WordSpaceError};
use crate::store::{EncodedField, WordRecord};
use crate::vector::{FeatureKey, Relation, SparseVector};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prefix stripped from every stored neighbor similarity.
const NEIGHBOR_VALUE_PREFIX: &str = "0.";

/// How collocation features are keyed when a record becomes a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSpace {
    /// Keyed by word; weights of one word across relations are summed
    #[default]
    Aggregated,
    /// Keyed by word and relation
    Positional,
}

impl FromStr for FeatureSpace {
    type Err = WordSpaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aggregated" => Ok(FeatureSpace::Aggregated),
            "positional" => Ok(FeatureSpace::Positional),
            other => Err(WordSpaceError::SerializationError(format!(
                "unknown feature space: {}",
                other
            ))),
        }
    }
}

/// A collocation of a word with its significance.
///
/// `relation` is `None` when the collocation is summed over all relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Collocation {
    pub word: String,
    pub value: f32,
    pub relation: Option<Relation>,
}

/// A distributionally similar word with its similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    pub similarity: f32,
}

/// Split like the store's writer joined: on single spaces, trailing empties dropped.
fn tokens(s: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = s.split(' ').collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// Pair up the data tokens of a field, skipping the leading artifact token.
fn field_pairs<'a>(
    record: &WordRecord,
    field: &'a EncodedField,
    name: &str,
) -> Result<Vec<(&'a str, &'a str)>> {
    let words = tokens(&field.words);
    let values = tokens(&field.values);
    if words.len() != values.len() {
        return Err(WordSpaceError::malformed(
            &record.word,
            format!(
                "{}: {} words but {} values",
                name,
                words.len(),
                values.len()
            ),
        ));
    }
    Ok(words.into_iter().zip(values).skip(1).collect())
}

fn parse_value(record: &WordRecord, name: &str, raw: &str) -> Result<f32> {
    raw.parse::<f32>().map_err(|_| {
        WordSpaceError::malformed(&record.word, format!("{}: invalid value {:?}", name, raw))
    })
}

/// Decode the collocations of every relation in store order.
pub fn decode_collocations(record: &WordRecord) -> Result<Vec<Collocation>> {
    let mut out = Vec::new();
    for relation in Relation::all() {
        let name = format!("kol{}", relation);
        for (word, raw) in field_pairs(record, record.collocation_field(relation), &name)? {
            out.push(Collocation {
                word: word.to_string(),
                value: parse_value(record, &name, raw)?,
                relation: Some(relation),
            });
        }
    }
    Ok(out)
}

/// Decode collocations into a vector keyed by `(word, relation)`.
pub fn decode_collocation_vector(record: &WordRecord) -> Result<SparseVector> {
    let mut vector = SparseVector::new();
    for c in decode_collocations(record)? {
        if let Some(relation) = c.relation {
            vector.insert(FeatureKey::Positional(c.word, relation), c.value);
        }
    }
    Ok(vector)
}

/// Decode collocations into a word-keyed vector, summing over relations.
pub fn decode_collocation_vector_aggregated(record: &WordRecord) -> Result<SparseVector> {
    let mut vector = SparseVector::new();
    for c in decode_collocations(record)? {
        vector.accumulate(FeatureKey::Word(c.word), c.value);
    }
    Ok(vector)
}

/// Decode collocations into the vector shape selected by `space`.
pub fn decode_vector(record: &WordRecord, space: FeatureSpace) -> Result<SparseVector> {
    match space {
        FeatureSpace::Aggregated => decode_collocation_vector_aggregated(record),
        FeatureSpace::Positional => decode_collocation_vector(record),
    }
}

/// Decode the neighbor list in store order, restoring each value's `"0."` prefix.
pub fn decode_neighbor_list(record: &WordRecord) -> Result<Vec<Neighbor>> {
    field_pairs(record, &record.neighbors, "dsb")?
        .into_iter()
        .map(|(word, raw)| {
            let restored = format!("{}{}", NEIGHBOR_VALUE_PREFIX, raw);
            Ok(Neighbor {
                word: word.to_string(),
                similarity: parse_value(record, "dsbSim", &restored)?,
            })
        })
        .collect()
}
