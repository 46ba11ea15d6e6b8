// This module defines the boundary between the registration merger and whatever assembles
// the output archive. ArchiveParticipant is the capability interface an assembler drives
// (opened / add / add_source / closing); ArchiveSink is the minimal "write one entry"
// interface the participant uses to inject merged output at close. Two sinks are provided:
// MemoryArchive for tests and embedding, and DirectoryArchive which lays entries out on disk.
// ArchiveAssembler ties them together for one archive and copies every entry the participant
// does not consume. ArchiveError wraps MergeError together with I/O and layout failures.

//! Archive assembly boundary.
//!
//! The assembler only knows the [`ArchiveParticipant`] trait, so any
//! participant can be driven by it and the merger never depends on a concrete
//! archive writer:
//!
//! ```
//! use regmerge::archive::{ArchiveAssembler, MemoryArchive};
//! use regmerge::core::{LineSeparator, RegistrationMerger, RegistrationPaths};
//!
//! let mut jar = MemoryArchive::new("app.jar");
//! let merger = RegistrationMerger::new(RegistrationPaths::truffle())
//!     .with_separator(LineSeparator::Lf);
//! let mut asm = ArchiveAssembler::new(merger, "app.jar", &mut jar).unwrap();
//! asm.add_entry("META-INF/truffle/language", b"language1.id=js\n").unwrap();
//! asm.add_entry("META-INF/truffle/language", b"language1.id=py\n").unwrap();
//! asm.finish().unwrap();
//!
//! assert_eq!(
//!     jar.get_str("META-INF/truffle/language"),
//!     Some("language1.id=js\nlanguage2.id=py\n")
//! );
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::{MergeError, RegistrationMerger};

pub mod assembler;
pub mod directory;
pub mod memory;

pub use assembler::{ArchiveAssembler, AssemblyStats};
pub use directory::{read_module_dir, DirectoryArchive};
pub use memory::MemoryArchive;

/// Errors raised while assembling an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("archive already contains an entry named {path}")]
    DuplicateEntry {
        path: String,
    },

    #[error("output directory {} is not empty", .path.display())]
    OutputNotEmpty {
        path: PathBuf,
    },

    #[error("invalid archive entry path '{path}': {reason}")]
    InvalidPath {
        path: String,
        reason: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read module directory {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Result type alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// A file destined for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path using `/` separators.
    pub path: String,
    pub contents: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Destination of archive entries.
pub trait ArchiveSink {
    /// Write one entry. Writing the same path twice is an error.
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()>;
}

/// Hooks an archive assembler calls while building one archive.
///
/// `opened` is called before any entry is offered and `closing` exactly
/// once after the last one.
pub trait ArchiveParticipant {
    fn opened(&mut self, archive: &str) -> ArchiveResult<()>;

    /// Offer an entry of the main archive. Returning `true` means the
    /// participant consumed it and the assembler must not copy it.
    fn add(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<bool>;

    /// Offer an entry of the sources archive.
    fn add_source(&mut self, path: &str, contents: &[u8]) -> bool;

    /// Emit any entries the participant produces into `sink`.
    fn closing(&mut self, sink: &mut dyn ArchiveSink) -> ArchiveResult<()>;
}

impl ArchiveParticipant for RegistrationMerger {
    fn opened(&mut self, archive: &str) -> ArchiveResult<()> {
        Ok(self.open(archive)?)
    }

    fn add(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<bool> {
        Ok(RegistrationMerger::add(self, path, contents)?)
    }

    fn add_source(&mut self, path: &str, contents: &[u8]) -> bool {
        RegistrationMerger::add_source(self, path, contents)
    }

    fn closing(&mut self, sink: &mut dyn ArchiveSink) -> ArchiveResult<()> {
        let separator = self.separator();
        for registry in self.close()? {
            sink.write_entry(registry.kind().path(), registry.render(separator).as_bytes())?;
        }
        Ok(())
    }
}

impl<P: ArchiveParticipant + ?Sized> ArchiveParticipant for &mut P {
    fn opened(&mut self, archive: &str) -> ArchiveResult<()> {
        (**self).opened(archive)
    }

    fn add(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<bool> {
        (**self).add(path, contents)
    }

    fn add_source(&mut self, path: &str, contents: &[u8]) -> bool {
        (**self).add_source(path, contents)
    }

    fn closing(&mut self, sink: &mut dyn ArchiveSink) -> ArchiveResult<()> {
        (**self).closing(sink)
    }
}
