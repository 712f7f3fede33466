//! File-backed, read-only word space.
//!
//! A word-space directory holds `manifest.json` and `words.dat`. The data
//! file is a sequence of frames:
//!
//! `[length: u32][crc32: u32][payload: bincode(WordRecord)]`
//!
//! A frame with a bad checksum or payload stays addressable as a corrupt
//! entry, so scans can skip and count it. A truncated tail counts as one
//! corrupt entry and ends the frame table.

use crate::error::{Result, WordSpaceError};
use crate::persistence::serialization::{self, Manifest, FORMAT_VERSION};
use crate::store::{WordRecord, WordSpaceStore};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the framed record file inside a word-space directory.
pub const DATA_FILE: &str = "words.dat";
/// Name of the manifest inside a word-space directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Frame header: [length: u32][crc32: u32]
const FRAME_HEADER_SIZE: usize = 8;

#[derive(Debug)]
enum Entry {
    /// Decoded at open time
    Loaded(WordRecord),
    /// Payload location inside the mapped data file
    Mapped { offset: usize, len: usize },
    Corrupt(String),
}

/// A word space opened from a directory.
#[derive(Debug)]
pub struct FileWordSpace {
    dir: PathBuf,
    /// Present only when records are decoded on demand
    mmap: Option<Mmap>,
    entries: Vec<Entry>,
    /// Word -> entry position; the first frame of a word wins
    positions: HashMap<String, usize>,
    corrupt: usize,
}

fn unavailable(path: &Path, reason: impl Into<String>) -> WordSpaceError {
    WordSpaceError::StoreUnavailable {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

impl FileWordSpace {
    /// Open a word-space directory.
    ///
    /// With `load_into_memory` every record is decoded once and the file is
    /// released; otherwise the data file stays memory-mapped and records are
    /// decoded on each access.
    pub fn open(dir: impl AsRef<Path>, load_into_memory: bool) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(unavailable(&dir, "not a directory"));
        }

        let manifest_bytes =
            fs::read(dir.join(MANIFEST_FILE)).map_err(|e| unavailable(&dir, e.to_string()))?;
        let manifest: Manifest = serialization::from_json(&manifest_bytes)
            .map_err(|e| unavailable(&dir, e.to_string()))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(unavailable(
                &dir,
                format!(
                    "format version {} (expected {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            ));
        }

        let file = File::open(dir.join(DATA_FILE)).map_err(|e| unavailable(&dir, e.to_string()))?;
        let file_len = file.metadata()?.len();
        let mmap = if file_len == 0 {
            None
        } else {
            // The data file is never written while a reader holds it.
            Some(unsafe { Mmap::map(&file) }.map_err(|e| unavailable(&dir, e.to_string()))?)
        };

        let mut space = Self {
            dir,
            mmap: None,
            entries: Vec::with_capacity(manifest.word_count),
            positions: HashMap::with_capacity(manifest.word_count),
            corrupt: 0,
        };
        if let Some(bytes) = mmap.as_deref() {
            space.read_frames(bytes, load_into_memory);
        }
        if !load_into_memory {
            space.mmap = mmap;
        }

        if space.entries.len() != manifest.word_count {
            warn!(
                dir = %space.dir.display(),
                manifest = manifest.word_count,
                frames = space.entries.len(),
                "word count differs from manifest"
            );
        }
        if space.corrupt > 0 {
            warn!(dir = %space.dir.display(), corrupt = space.corrupt, "word space has defect entries");
        }
        info!(
            dir = %space.dir.display(),
            words = space.entries.len(),
            in_memory = load_into_memory,
            "opened word space"
        );
        Ok(space)
    }

    /// Build the frame table and word index from the raw data file.
    fn read_frames(&mut self, bytes: &[u8], keep_records: bool) {
        let mut pos = 0;
        while pos < bytes.len() {
            if pos + FRAME_HEADER_SIZE > bytes.len() {
                self.push_corrupt("truncated frame header");
                break;
            }
            let len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap_or_default()) as usize;
            let expected_crc = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap_or_default());
            let offset = pos + FRAME_HEADER_SIZE;
            if offset + len > bytes.len() {
                self.push_corrupt("truncated payload");
                break;
            }
            pos = offset + len;

            let payload = &bytes[offset..offset + len];
            if crc32fast::hash(payload) != expected_crc {
                self.push_corrupt("checksum mismatch");
                continue;
            }
            let record: WordRecord = match serialization::from_bincode(payload) {
                Ok(record) => record,
                Err(e) => {
                    self.push_corrupt(e.to_string());
                    continue;
                }
            };

            let position = self.entries.len();
            self.positions.entry(record.word.clone()).or_insert(position);
            if keep_records {
                self.entries.push(Entry::Loaded(record));
            } else {
                self.entries.push(Entry::Mapped { offset, len });
            }
        }
    }

    fn push_corrupt(&mut self, reason: impl Into<String>) {
        self.entries.push(Entry::Corrupt(reason.into()));
        self.corrupt += 1;
    }

    /// Number of entries that cannot be read.
    pub fn corrupt_entries(&self) -> usize {
        self.corrupt
    }

    /// Whether records were decoded into memory at open time.
    pub fn is_in_memory(&self) -> bool {
        self.mmap.is_none()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Release the word space. The handle is consumed.
    pub fn close(self) {
        info!(dir = %self.dir.display(), "closed word space");
    }
}

impl WordSpaceStore for FileWordSpace {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn record_at(&self, position: usize) -> Result<WordRecord> {
        let corrupt = |reason: &str| WordSpaceError::malformed(format!("#{}", position), reason);
        match self.entries.get(position) {
            Some(Entry::Loaded(record)) => Ok(record.clone()),
            Some(Entry::Mapped { offset, len }) => {
                let bytes = self
                    .mmap
                    .as_deref()
                    .ok_or_else(|| corrupt("data file not mapped"))?;
                serialization::from_bincode(&bytes[*offset..*offset + *len])
                    .map_err(|e| corrupt(&e.to_string()))
            }
            Some(Entry::Corrupt(reason)) => Err(corrupt(reason)),
            None => Err(corrupt("position out of range")),
        }
    }

    fn find(&self, word: &str) -> Result<Option<WordRecord>> {
        debug!(word, "lookup");
        match self.positions.get(word) {
            Some(&position) => self.record_at(position).map(Some),
            None => Ok(None),
        }
    }
}

/// Writes a word-space directory that [`FileWordSpace`] can open.
pub struct WordSpaceWriter {
    dir: PathBuf,
    out: BufWriter<File>,
    count: usize,
}

impl WordSpaceWriter {
    /// Create (or overwrite) a word space in `dir`.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let file = File::create(dir.join(DATA_FILE))?;
        Ok(Self {
            dir,
            out: BufWriter::new(file),
            count: 0,
        })
    }

    /// Append one record frame.
    pub fn append(&mut self, record: &WordRecord) -> Result<()> {
        let payload = serialization::to_bincode(record)?;
        let crc = crc32fast::hash(&payload);
        let len = payload.len() as u32;

        self.out.write_all(&len.to_le_bytes())?;
        self.out.write_all(&crc.to_le_bytes())?;
        self.out.write_all(&payload)?;
        self.count += 1;
        Ok(())
    }

    /// Flush the data file and write the manifest.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        fs::write(
            self.dir.join(MANIFEST_FILE),
            serialization::to_json(&Manifest::new(self.count))?,
        )?;
        Ok(self.dir)
    }
}

/// Write `records` to a new word space in `dir`.
pub fn write_word_space<'a>(
    dir: impl AsRef<Path>,
    records: impl IntoIterator<Item = &'a WordRecord>,
) -> Result<PathBuf> {
    let mut writer = WordSpaceWriter::create(dir)?;
    for record in records {
        writer.append(record)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Relation;
    use tempfile::TempDir;

    fn sample_records() -> Vec<WordRecord> {
        let rel = Relation::new(1).unwrap();
        vec![
            WordRecord::new("apple", 10).with_collocations(rel, " eat", " 2.0"),
            WordRecord::new("pear", 7).with_neighbors(" apple", " 61"),
            WordRecord::new("stone", 3),
        ]
    }

    fn corrupt_byte(path: &Path, at: usize) {
        let mut bytes = fs::read(path).unwrap();
        bytes[at] ^= 0xFF;
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_write_and_open_mapped() {
        let dir = TempDir::new().unwrap();
        let records = sample_records();
        write_word_space(dir.path(), &records).unwrap();

        let space = FileWordSpace::open(dir.path(), false).unwrap();
        assert!(!space.is_in_memory());
        assert_eq!(space.count(), 3);
        assert_eq!(space.corrupt_entries(), 0);
        assert_eq!(space.lookup_exact("pear").unwrap(), Some(records[1].clone()));
        assert_eq!(space.record_at(2).unwrap().word, "stone");
        assert!(space.lookup_exact("plum").unwrap().is_none());
    }

    #[test]
    fn test_open_in_memory() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &sample_records()).unwrap();

        let space = FileWordSpace::open(dir.path(), true).unwrap();
        assert!(space.is_in_memory());
        assert_eq!(space.lookup_exact("apple").unwrap().unwrap().frequency, 10);
        let words: Vec<String> = space.iterate_all().map(|r| r.unwrap().word).collect();
        assert_eq!(words, vec!["apple", "pear", "stone"]);
        space.close();
    }

    #[test]
    fn test_manifest_written() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &sample_records()).unwrap();
        let manifest: Manifest =
            serialization::from_json(&fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest, Manifest::new(3));
    }

    #[test]
    fn test_corrupt_frame_is_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &sample_records()).unwrap();
        // First payload byte of the first frame
        corrupt_byte(&dir.path().join(DATA_FILE), FRAME_HEADER_SIZE);

        for in_memory in [false, true] {
            let space = FileWordSpace::open(dir.path(), in_memory).unwrap();
            assert_eq!(space.count(), 3);
            assert_eq!(space.corrupt_entries(), 1);
            assert!(matches!(
                space.record_at(0),
                Err(WordSpaceError::MalformedRecord { .. })
            ));
            assert!(space.lookup_exact("apple").unwrap().is_none());
            assert!(space.lookup_exact("stone").unwrap().is_some());
            let readable = space.iterate_all().filter(|r| r.is_ok()).count();
            assert_eq!(readable, 2);
        }
    }

    #[test]
    fn test_truncated_tail() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &sample_records()).unwrap();
        let path = dir.path().join(DATA_FILE);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let space = FileWordSpace::open(dir.path(), false).unwrap();
        assert_eq!(space.count(), 3);
        assert_eq!(space.corrupt_entries(), 1);
        assert!(space.lookup_exact("stone").unwrap().is_none());
    }

    #[test]
    fn test_empty_word_space() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &[]).unwrap();
        let space = FileWordSpace::open(dir.path(), false).unwrap();
        assert!(space.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = FileWordSpace::open(dir.path().join("nope"), false);
        assert!(matches!(result, Err(WordSpaceError::StoreUnavailable { .. })));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DATA_FILE), b"").unwrap();
        let result = FileWordSpace::open(dir.path(), true);
        assert!(matches!(result, Err(WordSpaceError::StoreUnavailable { .. })));
    }

    #[test]
    fn test_unknown_format_version() {
        let dir = TempDir::new().unwrap();
        write_word_space(dir.path(), &sample_records()).unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            br#"{"format_version": 99, "word_count": 3}"#,
        )
        .unwrap();
        let result = FileWordSpace::open(dir.path(), false);
        assert!(matches!(result, Err(WordSpaceError::StoreUnavailable { .. })));
    }
}
