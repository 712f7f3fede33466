//! On-disk word spaces: framed record file, manifest, and writer.

pub mod serialization;
pub mod file_store;

pub use file_store::{FileWordSpace, WordSpaceWriter};
