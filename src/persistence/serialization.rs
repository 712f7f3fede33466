//! Serialization utilities: bincode for word records, JSON for the manifest.

use crate::error::{Result, WordSpaceError};
use serde::{Deserialize, Serialize};

/// Current layout of `words.dat`.
pub const FORMAT_VERSION: u32 = 1;

/// Human-readable description of a word-space directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub word_count: usize,
}

impl Manifest {
    pub fn new(word_count: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            word_count,
        }
    }
}

/// Encode data to bincode bytes.
pub fn to_bincode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| WordSpaceError::SerializationError(e.to_string()))
}

/// Decode data from bincode bytes.
pub fn from_bincode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| WordSpaceError::SerializationError(e.to_string()))
}

/// Encode data to pretty-printed JSON bytes.
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| WordSpaceError::SerializationError(e.to_string()))
}

/// Decode data from JSON bytes.
pub fn from_json<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| WordSpaceError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WordRecord;
    use crate::vector::Relation;

    #[test]
    fn test_record_bincode() {
        let record = WordRecord::new("haus", 120)
            .with_neighbors(" gebäude", " 4411")
            .with_collocations(Relation::new(3).unwrap(), " das", " 12.5");
        let bytes = to_bincode(&record).unwrap();
        let decoded: WordRecord = from_bincode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_manifest_json() {
        let bytes = to_json(&Manifest::new(3)).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"word_count\": 3"));
        let decoded: Manifest = from_json(&bytes).unwrap();
        assert_eq!(decoded.format_version, FORMAT_VERSION);
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        let result: Result<WordRecord> = from_bincode(&[0xFF, 0x01]);
        assert!(matches!(result, Err(WordSpaceError::SerializationError(_))));
    }
}
