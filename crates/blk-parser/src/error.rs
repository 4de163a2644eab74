//! Error types for file-set resolution, block decoding and enumeration.

use std::io;
use thiserror::Error;

/// Why a directory does not hold a usable blk file sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileSetError {
    /// A file is out of sequence; names must run `blk00000.dat`,
    /// `blk00001.dat`, ... with no gaps.
    #[error("expected {expected} but found {found}; files must match blk?????.dat from blk00000.dat with no gaps")]
    UnexpectedFileName { expected: String, found: String },
    /// The file to resume from is not part of the sequence.
    #[error("resume file {name} is not in the blockchain directory")]
    MissingResumeFile { name: String },
    /// The directory path could not be turned into a file pattern.
    #[error("invalid blockchain file pattern: {0}")]
    InvalidPattern(String),
}

/// Malformed bytes in a block record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("invalid block magic {found:#010x}, expected {expected:#010x}")]
    MagicMismatch { expected: u32, found: u32 },
    #[error("block header has size {actual}, expected {expected}")]
    InvalidHeaderSize { expected: usize, actual: usize },
    #[error("read of {requested} bytes at offset {offset} exceeds block of {available} bytes")]
    OutOfBounds { offset: usize, requested: usize, available: usize },
    #[error("block record truncated: expected {expected} bytes, {available} available")]
    TruncatedRecord { expected: u64, available: u64 },
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
}

/// Failure decoding a single block payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("unknown block version: {0} ({0:#x})")]
    UnknownBlockVersion(u32),
}

/// Errors surfaced by the blockchain parser.
#[derive(Error, Debug)]
pub enum ParserError {
    /// The blk file set is unusable. Raised before any block is read.
    #[error("invalid blockchain files: {0}")]
    InvalidFileSet(#[from] FileSetError),
    /// A block record in `file` is corrupt.
    #[error("invalid blockchain content in {file}: {error}")]
    InvalidContent { file: String, error: ContentError },
    /// A block in `file` has a version missing from the known versions table.
    #[error("unknown block version {version} ({version:#x}) in {file}")]
    UnknownBlockVersion { file: String, version: u32 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ParserError {
    /// Attach the source file name to a decode failure.
    pub fn from_decode(file: &str, error: DecodeError) -> Self {
        match error {
            DecodeError::Content(error) => ParserError::InvalidContent {
                file: file.to_string(),
                error,
            },
            DecodeError::UnknownBlockVersion(version) => ParserError::UnknownBlockVersion {
                file: file.to_string(),
                version,
            },
        }
    }

    pub(crate) fn content(file: &str, error: ContentError) -> Self {
        ParserError::InvalidContent {
            file: file.to_string(),
            error,
        }
    }
}
