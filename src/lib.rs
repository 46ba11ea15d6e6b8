//! regmerge - registration descriptor merging for archive assembly.
//!
//! When several modules are packed into one archive, each may ship its own
//! registration descriptor (for example `META-INF/truffle/language`) whose
//! entries are numbered from 1. Concatenating them would produce colliding
//! keys, so the [`RegistrationMerger`] collects every descriptor of a kind
//! while the archive is assembled and writes one densely renumbered
//! descriptor when it closes.
//!
//! # Primary Usage
//!
//! ```
//! use regmerge::core::{LineSeparator, RegistrationMerger, RegistrationPaths};
//!
//! let mut merger = RegistrationMerger::new(RegistrationPaths::truffle())
//!     .with_separator(LineSeparator::Lf);
//! merger.open("app.jar")?;
//! assert!(merger.add("META-INF/truffle/language", b"language1.id=py\n")?);
//! assert!(merger.add("META-INF/truffle/language", b"language1.id=rb\n")?);
//! assert!(!merger.add("com/acme/Foo.class", b"\xca\xfe\xba\xbe")?);
//!
//! let merged = merger.close()?;
//! assert_eq!(merged[0].render(LineSeparator::Lf), "language1.id=py\nlanguage2.id=rb\n");
//! # Ok::<(), regmerge::core::MergeError>(())
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Descriptor parsing, renumbering and the per-archive merger
//! - [`archive`] - Participant/sink traits and an assembler that drives them

pub mod archive;
pub mod core;

pub use crate::core::{
    ContributionBlock, Kind, LineSeparator, MergeError, MergeResult, MergedRegistry,
    RegistrationMerger, RegistrationPaths,
};
pub use archive::{
    ArchiveAssembler, ArchiveError, ArchiveParticipant, ArchiveResult, ArchiveSink,
    AssemblyStats, DirectoryArchive, MemoryArchive,
};
