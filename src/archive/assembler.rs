// This module drives one archive participant through the construction of one archive. The
// assembler calls opened() on construction, offers every entry to add() and copies through
// the entries the participant leaves unhandled, routes sources-archive entries through
// add_source(), and finally calls closing() so the participant can inject what it merged.
// When two modules contribute the same ordinary path the first copy wins and the overlap is
// logged. finish() consumes the assembler, so a participant is never driven past one archive.

//! Single-archive assembly driver.

use std::collections::HashSet;

use super::{ArchiveEntry, ArchiveParticipant, ArchiveResult, ArchiveSink};

/// Counters reported by [`ArchiveAssembler::finish`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Entries copied into the archive unchanged.
    pub entries_copied: usize,
    /// Entries consumed by the participant.
    pub entries_consumed: usize,
    /// Entries the participant wrote at close.
    pub entries_emitted: usize,
    /// Ordinary entries dropped because an earlier module already provided them.
    pub overlaps_skipped: usize,
    /// Entries copied into the sources archive.
    pub sources_copied: usize,
    /// Sources archive entries dropped because an earlier module already provided them.
    pub source_overlaps_skipped: usize,
}

/// Builds one archive, offering every entry to a participant first.
pub struct ArchiveAssembler<'a, P: ArchiveParticipant> {
    name: String,
    participant: P,
    archive: &'a mut dyn ArchiveSink,
    sources: Option<&'a mut dyn ArchiveSink>,
    written: HashSet<String>,
    written_sources: HashSet<String>,
    stats: AssemblyStats,
}

impl<'a, P: ArchiveParticipant> ArchiveAssembler<'a, P> {
    /// Open archive `name` writing to `archive`.
    pub fn new(mut participant: P, name: &str, archive: &'a mut dyn ArchiveSink) -> ArchiveResult<Self> {
        participant.opened(name)?;
        Ok(Self {
            name: name.to_string(),
            participant,
            archive,
            sources: None,
            written: HashSet::new(),
            written_sources: HashSet::new(),
            stats: AssemblyStats::default(),
        })
    }

    /// Attach the accompanying sources archive.
    pub fn with_sources(mut self, sources: &'a mut dyn ArchiveSink) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offer one entry and copy it through unless the participant consumed it.
    pub fn add_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()> {
        if self.participant.add(path, contents)? {
            self.stats.entries_consumed += 1;
            return Ok(());
        }

        if !self.written.insert(path.to_string()) {
            log::warn!("{}: skipping overlapping entry {}", self.name, path);
            self.stats.overlaps_skipped += 1;
            return Ok(());
        }
        self.archive.write_entry(path, contents)?;
        self.stats.entries_copied += 1;
        Ok(())
    }

    /// Offer every entry of one module, in slice order.
    pub fn add_module(&mut self, entries: &[ArchiveEntry]) -> ArchiveResult<()> {
        for entry in entries {
            self.add_entry(&entry.path, &entry.contents)?;
        }
        Ok(())
    }

    /// Offer one entry of the sources archive.
    ///
    /// Without an attached sources archive the entry is dropped.
    pub fn add_source_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()> {
        if self.participant.add_source(path, contents) {
            return Ok(());
        }
        let Some(sources) = self.sources.as_mut() else {
            log::debug!("{}: no sources archive, dropping {}", self.name, path);
            return Ok(());
        };

        if !self.written_sources.insert(path.to_string()) {
            log::warn!("{}: skipping overlapping source entry {}", self.name, path);
            self.stats.source_overlaps_skipped += 1;
            return Ok(());
        }
        sources.write_entry(path, contents)?;
        self.stats.sources_copied += 1;
        Ok(())
    }

    /// Let the participant emit its entries and finish the archive.
    pub fn finish(mut self) -> ArchiveResult<AssemblyStats> {
        let mut sink = CountingSink {
            inner: &mut *self.archive,
            written: 0,
        };
        self.participant.closing(&mut sink)?;
        self.stats.entries_emitted = sink.written;

        log::info!(
            "{}: {} copied, {} consumed, {} emitted, {} overlaps skipped, {} sources copied, {} source overlaps skipped",
            self.name,
            self.stats.entries_copied,
            self.stats.entries_consumed,
            self.stats.entries_emitted,
            self.stats.overlaps_skipped,
            self.stats.sources_copied,
            self.stats.source_overlaps_skipped
        );
        Ok(self.stats)
    }
}

struct CountingSink<'s> {
    inner: &'s mut dyn ArchiveSink,
    written: usize,
}

impl ArchiveSink for CountingSink<'_> {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()> {
        self.inner.write_entry(path, contents)?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    /// Consumes `*.tmp` entries and writes a count file at close.
    #[derive(Default)]
    struct TmpCounter {
        opened: Option<String>,
        seen: usize,
    }

    impl ArchiveParticipant for TmpCounter {
        fn opened(&mut self, archive: &str) -> ArchiveResult<()> {
            self.opened = Some(archive.to_string());
            Ok(())
        }

        fn add(&mut self, path: &str, _contents: &[u8]) -> ArchiveResult<bool> {
            let tmp = path.ends_with(".tmp");
            self.seen += usize::from(tmp);
            Ok(tmp)
        }

        fn add_source(&mut self, _path: &str, _contents: &[u8]) -> bool {
            false
        }

        fn closing(&mut self, sink: &mut dyn ArchiveSink) -> ArchiveResult<()> {
            sink.write_entry("tmp-count", self.seen.to_string().as_bytes())
        }
    }

    #[test]
    fn test_participant_is_generic() {
        let mut jar = MemoryArchive::new("x.jar");
        let mut counter = TmpCounter::default();
        let mut asm = ArchiveAssembler::new(&mut counter, "x.jar", &mut jar).unwrap();
        asm.add_entry("a.tmp", b"").unwrap();
        asm.add_entry("b.txt", b"b").unwrap();
        asm.add_entry("c.tmp", b"").unwrap();
        let stats = asm.finish().unwrap();

        assert_eq!(counter.opened.as_deref(), Some("x.jar"));
        assert_eq!(stats.entries_consumed, 2);
        assert_eq!(stats.entries_copied, 1);
        assert_eq!(stats.entries_emitted, 1);
        assert_eq!(jar.paths().collect::<Vec<_>>(), ["b.txt", "tmp-count"]);
        assert_eq!(jar.get_str("tmp-count"), Some("2"));
    }

    #[test]
    fn test_overlapping_entries_keep_first() {
        let mut jar = MemoryArchive::new("x.jar");
        let mut asm = ArchiveAssembler::new(TmpCounter::default(), "x.jar", &mut jar).unwrap();
        asm.add_entry("META-INF/MANIFEST.MF", b"first").unwrap();
        asm.add_entry("META-INF/MANIFEST.MF", b"second").unwrap();
        let stats = asm.finish().unwrap();

        assert_eq!(stats.overlaps_skipped, 1);
        assert_eq!(jar.get_str("META-INF/MANIFEST.MF"), Some("first"));
    }

    #[test]
    fn test_source_overlaps_are_counted_separately() {
        let mut jar = MemoryArchive::new("x.jar");
        let mut src = MemoryArchive::new("x.src.zip");
        let mut asm = ArchiveAssembler::new(TmpCounter::default(), "x.jar", &mut jar)
            .unwrap()
            .with_sources(&mut src);
        asm.add_entry("Foo.class", b"foo").unwrap();
        asm.add_source_entry("Foo.java", b"first").unwrap();
        asm.add_source_entry("Foo.java", b"second").unwrap();
        let stats = asm.finish().unwrap();

        assert_eq!(stats.overlaps_skipped, 0);
        assert_eq!(stats.source_overlaps_skipped, 1);
        assert_eq!(stats.sources_copied, 1);
        assert_eq!(src.get_str("Foo.java"), Some("first"));
    }

    #[test]
    fn test_sources_without_archive_are_dropped() {
        let mut jar = MemoryArchive::new("x.jar");
        let mut asm = ArchiveAssembler::new(TmpCounter::default(), "x.jar", &mut jar).unwrap();
        asm.add_source_entry("com/acme/Foo.java", b"class Foo {}").unwrap();
        let stats = asm.finish().unwrap();
        assert_eq!(stats.sources_copied, 0);
        assert!(!jar.contains("com/acme/Foo.java"));
    }
}
