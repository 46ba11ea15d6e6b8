// This module defines error types for the registration merger using the thiserror crate for
// idiomatic Rust error handling. MergeError is the main error enum covering the failure
// scenarios of the merge: descriptor lines that do not match the registration pattern,
// descriptors that are not valid UTF-8, invalid kind tables, lifecycle misuse (adding
// before the archive was opened, opening twice, or reusing a merger after close), and calls
// made after a rejected descriptor aborted the merge. Each variant carries the context
// (archive path, line number, offending line) needed to find the upstream artifact that
// broke the contract. MergeResult<T> is the convenience alias.

//! Error types for the registration merger.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Main error type for descriptor merging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("line {line_number} in {path} does not match {pattern}: {line}")]
    FormatViolation {
        path: String,
        line_number: usize,
        line: String,
        pattern: String,
    },

    #[error("registration descriptor {path} is not valid UTF-8")]
    InvalidEncoding {
        path: String,
    },

    #[error("Invalid registration kind '{name}': {reason}")]
    InvalidKind {
        name: String,
        reason: String,
    },

    #[error("Invalid registration table: {reason}")]
    InvalidTable {
        reason: String,
    },

    #[error("merger received {path} before the archive was opened")]
    NotOpened {
        path: String,
    },

    #[error("merger is already accumulating for another archive")]
    AlreadyOpened,

    #[error("merge for {archive} was aborted by an earlier error: {reason}")]
    Aborted {
        archive: String,
        reason: String,
    },

    #[error("merger was already closed and cannot be reused for another archive")]
    Reused,
}

/// Result type alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
