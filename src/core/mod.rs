//! Core pairing logic and run state
//!
//! This module contains:
//! - Filename parsing into numeric keys and entry classification
//! - Pairing of audio entries with covers
//! - Run settings, phases and the observable progress record

mod matching;
mod naming;
mod state;

pub use matching::{match_pairs, MatchResult, MatchSummary, Pair};
pub use naming::{
    classify, cover_output_name, extract_key, identify, plain_output_name, FileKind, NumericKey,
};
pub use state::{
    OutputCompression, Phase, PipelineConfig, ProcessingStatus, StatusReporter, PREVIEW_LIMIT,
};
