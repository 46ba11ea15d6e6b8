//! In-memory archive sink.

use std::collections::HashMap;

use super::{ArchiveError, ArchiveResult, ArchiveSink};

/// Archive held in memory, entries kept in write order.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl MemoryArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.index
            .get(path)
            .map(|&idx| self.entries[idx].1.as_slice())
    }

    /// Entry contents as text, if present and valid UTF-8.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entry paths in write order.
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveSink for MemoryArchive {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()> {
        if self.index.contains_key(path) {
            return Err(ArchiveError::DuplicateEntry {
                path: path.to_string(),
            });
        }
        self.index.insert(path.to_string(), self.entries.len());
        self.entries.push((path.to_string(), contents.to_vec()));
        Ok(())
    }
}
