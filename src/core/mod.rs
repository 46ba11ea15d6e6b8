// This module is the central hub of the registration merger. It organizes the pieces that
// turn many per-module registration descriptors into one: the kind table and line separator
// configuration (kind), descriptor parsing into contribution blocks (descriptor), the
// sort-then-assign renumbering and rendering (registry), the per-archive state machine that
// the archive assembler drives (merger), and the shared error type (error).

//! Core registration merging.
//!
//! # Key Components
//!
//! ## Kinds (`kind`)
//! - Exact-path table of recognized descriptor paths
//! - Per-kind data line regex
//!
//! ## Descriptors (`descriptor`)
//! - Comment and blank line skipping
//! - Grouping by original enumerated key
//!
//! ## Registry (`registry`)
//! - Lexicographic key order within a block, offer order across blocks
//! - Dense renumbering from 1
//!
//! ## Merger (`merger`)
//! - open / add / add_source / close lifecycle, one instance per archive

pub mod error;
pub mod kind;
pub mod descriptor;
pub mod registry;
pub mod merger;

pub use error::{
    MergeError,
    MergeResult,
};

pub use kind::{
    Kind,
    LineSeparator,
    RegistrationPaths,
};

pub use descriptor::ContributionBlock;

pub use registry::{
    merge_fragments,
    MergedEntry,
    MergedRegistry,
};

pub use merger::RegistrationMerger;
