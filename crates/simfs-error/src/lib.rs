#![forbid(unsafe_code)]
//! Error types for SimFS.
//!
//! Every failure a command can produce is a tagged variant carrying
//! structured context; rendering to human-readable shell text happens
//! at the presentation boundary (the CLI), not here. `Display` output
//! is phrased so that a `<command>: <error>` prefix reads like the
//! classic coreutils diagnostics.
//!
//! All conditions are local and recoverable: an `Err` leaves the
//! filesystem state exactly as it was before the call.
//!
//! This crate intentionally does not depend on `simfs-types`; parse
//! failures from the value types are converted into `SimfsError` at
//! the `simfs-core` boundary.

use thiserror::Error;

/// Unified error type for all SimFS operations.
#[derive(Debug, Error)]
pub enum SimfsError {
    /// Command invoked without its required argument.
    #[error("missing operand")]
    MissingOperand,

    /// Path or name did not resolve to any node.
    #[error("{0}: No such file or directory")]
    PathNotFound(String),

    /// A path component (or a listing target) is not a directory.
    #[error("{0}: Not a directory")]
    NotADirectory(String),

    /// File operation attempted on a directory, including removing a
    /// non-empty directory without the recursive flag.
    #[error("{0}: Is a directory")]
    IsADirectory(String),

    /// Sibling with the same name already exists.
    #[error("cannot create '{0}': File exists")]
    AlreadyExists(String),

    /// Projected usage would exceed the disk capacity.
    #[error("cannot create file: Disk full (requested {requested} bytes, {available} available)")]
    DiskFull { requested: u64, available: u64 },

    /// No single free run is long enough, even though enough free
    /// blocks may exist in aggregate.
    #[error("not enough contiguous space for file of size {requested} bytes")]
    InsufficientContiguousSpace { requested: u64 },

    /// Fewer free blocks than the allocation requires.
    #[error("not enough space for file of size {requested} bytes")]
    InsufficientSpace { requested: u64 },

    /// Permission mode is neither 3 octal digits nor a 9-character
    /// `rwx-` string.
    #[error("invalid mode: '{0}'")]
    InvalidPermissionFormat(String),

    /// Malformed command argument (flag value or unknown flag).
    #[error("invalid argument: '{0}'")]
    InvalidArgument(String),

    /// Allocation strategy name is not contiguous/linked/indexed.
    #[error("invalid allocation strategy: '{0}' (choose from: contiguous, linked, indexed)")]
    UnknownStrategy(String),

    /// Snapshot encode/decode failure.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Operating system I/O error (snapshot save/load only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using `SimfsError`.
pub type Result<T> = std::result::Result<T, SimfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_like_shell_diagnostics() {
        assert_eq!(
            SimfsError::PathNotFound("/tmp/x".into()).to_string(),
            "/tmp/x: No such file or directory"
        );
        assert_eq!(
            SimfsError::IsADirectory("d".into()).to_string(),
            "d: Is a directory"
        );
        assert_eq!(
            SimfsError::AlreadyExists("d".into()).to_string(),
            "cannot create 'd': File exists"
        );
        assert_eq!(
            SimfsError::InvalidPermissionFormat("79x".into()).to_string(),
            "invalid mode: '79x'"
        );
    }

    #[test]
    fn space_errors_stay_distinct() {
        let contiguous = SimfsError::InsufficientContiguousSpace { requested: 12288 };
        let aggregate = SimfsError::InsufficientSpace { requested: 12288 };
        assert_eq!(
            contiguous.to_string(),
            "not enough contiguous space for file of size 12288 bytes"
        );
        assert_eq!(
            aggregate.to_string(),
            "not enough space for file of size 12288 bytes"
        );
    }
}
