//! Error types for the cover embedding pipeline
//!
//! Run-level failures are [`PipelineError`]. Per-pair embed failures are
//! [`EmbedError`] and never escalate past the orchestrator.

use thiserror::Error;

use crate::core::{NumericKey, Phase};

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures while decoding or encoding the zip container
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Buffer does not start with a zip record signature
    #[error("buffer is not a zip archive")]
    BadSignature,

    /// Zip structure could not be read or written
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Entry's declared uncompressed size is implausible or wrong
    #[error("entry {path} declares {declared} bytes (read {actual:?})")]
    SizeMismatch {
        path: String,
        declared: u64,
        actual: Option<u64>,
    },

    /// Reading an entry or writing the output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures that end a run in [`Phase::Errored`] (or refuse to start one)
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not read archive.")]
    InvalidArchive(#[source] ArchiveError),

    #[error("no matching audio files found.")]
    EmptyArchive,

    /// Unexpected fault during decode, worker execution or encode
    #[error("error while processing files.")]
    Processing(String),

    #[error("a run is already in progress ({phase:?})")]
    Busy { phase: Phase },

    #[error("pipeline must be reset before starting a new run ({phase:?})")]
    ResetRequired { phase: Phase },
}

impl PipelineError {
    /// Human-readable message surfaced through `ProcessingStatus`
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Why a single cover could not be embedded
#[derive(Error, Debug)]
pub enum EmbedFailure {
    #[error("ID3v2 header is malformed")]
    MalformedHeader,

    #[error("ID3v2 tag declares {declared} bytes but only {available} are present")]
    TruncatedTag { declared: usize, available: usize },

    #[error("tag error: {0}")]
    Tag(#[from] id3::Error),
}

/// Per-pair embed failure; the orchestrator passes the original audio through
#[derive(Error, Debug)]
#[error("could not embed cover for {key}: {source}")]
pub struct EmbedError {
    pub key: NumericKey,
    #[source]
    pub source: EmbedFailure,
}
