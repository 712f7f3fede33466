//! # wordspace
//!
//! Distributional-semantics queries over a precomputed, read-only word space.
//!
//! This library provides:
//! - Decoding of the store's compact per-word fields into sparse vectors
//! - Vector composition (addition, multiplication, combined, dilation)
//! - Cosine and Dice similarity, first- and second-order word similarity
//! - Phrase composition and a brute-force nearest-neighbor corpus scan
//! - A file-backed word-space store
//!
//! ## Example
//!
//! ```rust
//! use wordspace::{MemoryWordSpace, Relation, WordRecord, WordSpace};
//!
//! let rel = Relation::new(1).unwrap();
//! let store = MemoryWordSpace::from_records(vec![
//!     WordRecord::new("apple", 12).with_collocations(rel, " eat red", " 2.0 1.0"),
//!     WordRecord::new("pear", 8).with_collocations(rel, " eat", " 3.0"),
//! ]);
//! let space = WordSpace::new(store);
//!
//! assert_eq!(space.frequency("apple").unwrap(), Some(12));
//! let sim = space.first_order_similarity("apple", "pear").unwrap();
//! assert!(sim.is_positive());
//! ```

pub mod algebra;
pub mod codec;
pub mod composition;
pub mod config;
pub mod error;
pub mod persistence;
pub mod scan;
pub mod semantics;
pub mod similarity;
pub mod store;
pub mod vector;

#[cfg(test)]
mod test_support;

pub use algebra::{CombinedWeights, CompositionMethod};
pub use codec::{Collocation, FeatureSpace, Neighbor};
pub use composition::Composed;
pub use config::{ScanMode, WordSpaceConfig};
pub use error::{Result, WordSpaceError};
pub use persistence::{FileWordSpace, WordSpaceWriter};
pub use scan::{CorpusScan, ScanReport, ScoredWord};
pub use semantics::{CommonFeature, FrequencyListReport, WordSpace};
pub use similarity::{Similarity, SimilarityMeasure};
pub use store::{MemoryWordSpace, WordRecord, WordSpaceStore};
pub use vector::{FeatureKey, Relation, SparseVector};
