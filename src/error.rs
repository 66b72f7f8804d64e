//! Error types for the xsum library
//!
//! This module defines all error types that can occur while generating or
//! checking checksums. Errors carry enough context to identify the offending
//! file or record, and I/O errors from the operating system are passed
//! through unwrapped.

use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the xsum library
pub type Result<T> = std::result::Result<T, XsumError>;

/// Main error type for all xsum operations
#[derive(Debug, Error)]
pub enum XsumError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Byte range where `start` ends up past `stop` after clamping
    #[error("invalid range: require start <= stop, but {start} > {stop}")]
    InvalidRange {
        /// Clamped start offset
        start: u64,
        /// Clamped stop offset
        stop: u64,
    },

    /// Directory passed to the hasher without directory hashing enabled
    #[error("{0:?} is a directory")]
    IsADirectory(PathBuf),

    /// Record text does not match the hash line grammar
    #[error("failed to parse hash line: {0:?}")]
    ParseHashLine(String),

    /// Digest mismatch while checking a hash line
    #[error("hash mismatch for {path:?} - expected: {expected}, actual: {actual}")]
    CheckHashLine {
        /// The raw hash line being checked
        line: String,
        /// Expected hash from the record, hex-encoded
        expected: String,
        /// Resolved path of the data file
        path: PathBuf,
        /// Recomputed hash, hex-encoded
        actual: String,
    },

    /// Malformed record inside a checksum file; aborts the rest of that file
    #[error("invalid hash line {line:?} at record {lineno}")]
    ParseHashFile {
        /// The raw offending line
        line: String,
        /// 1-based ordinal of the record within the checksum file
        lineno: usize,
    },

    /// Algorithm name not present in the registry
    #[error("unknown algorithm: {0:?}")]
    UnknownAlgorithm(String),

    /// Hex decoding error in a record's hash field
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Invalid glob pattern
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Path is not valid UTF-8 and cannot appear in a text record
    #[error("path conversion error: {0:?}")]
    PathConversion(OsString),

    /// Generic error for unexpected conditions
    #[error("internal error: {0}")]
    Internal(String),
}

impl XsumError {
    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        XsumError::Internal(msg.into())
    }

    /// Check if this error is a digest mismatch
    pub fn is_mismatch(&self) -> bool {
        matches!(self, XsumError::CheckHashLine { .. })
    }

    /// Check if this error is a record grammar failure
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            XsumError::ParseHashLine(_) | XsumError::ParseHashFile { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XsumError::InvalidRange { start: 9, stop: 5 };
        assert_eq!(
            err.to_string(),
            "invalid range: require start <= stop, but 9 > 5"
        );
    }

    #[test]
    fn test_error_predicates() {
        let mismatch = XsumError::CheckHashLine {
            line: "ff *a".to_string(),
            expected: "ff".to_string(),
            path: PathBuf::from("a"),
            actual: "00".to_string(),
        };
        assert!(mismatch.is_mismatch());
        assert!(!mismatch.is_parse());

        let parse = XsumError::ParseHashLine("garbage".to_string());
        assert!(parse.is_parse());
        assert!(!parse.is_mismatch());
    }

    #[test]
    fn test_io_passthrough() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: XsumError = io.into();
        assert!(matches!(err, XsumError::Io(_)));
    }
}
