//! Shared fixtures for unit tests

use crate::store::{MemoryWordSpace, WordRecord};
use crate::vector::Relation;

pub(crate) fn rel(position: u8) -> Relation {
    Relation::new(position).unwrap()
}

/// A small word space about fruit, with one word lacking collocations.
pub(crate) fn fruit_records() -> Vec<WordRecord> {
    vec![
        WordRecord::new("apple", 120)
            .with_collocations(rel(1), " eat fresh", " 2.0 1.0")
            .with_collocations(rel(4), " tree pie", " 3.0 1.5")
            .with_neighbors(" pear banana", " 61 40"),
        WordRecord::new("pear", 80)
            .with_collocations(rel(1), " eat", " 1.0")
            .with_collocations(rel(4), " tree", " 2.0")
            .with_neighbors(" apple plum", " 61 35"),
        WordRecord::new("fruit", 200)
            .with_collocations(rel(1), " fresh", " 2.0")
            .with_neighbors(" apple", " 5"),
        WordRecord::new("stone", 30)
            .with_collocations(rel(4), " wall", " 4.0")
            .with_neighbors(" rock", " 72"),
        WordRecord::new("void", 1),
    ]
}

pub(crate) fn fruit_space() -> MemoryWordSpace {
    MemoryWordSpace::from_records(fruit_records())
}
