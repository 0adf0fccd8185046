//! coverzip - embed cover art into MP3 files delivered in a zip archive
//!
//! Audio files and PNG covers are paired by the first three-digit number in
//! their names (`audio_001.mp3` + `cover_001.png`). Each paired MP3 gets the
//! image as its ID3v2 front cover; unpaired MP3s pass through unchanged. The
//! result is a new zip held in memory.
//!
//! [`pipeline::Pipeline`] is the entry point.

pub mod archive;
pub mod audio;
pub mod core;
pub mod error;
pub mod logging;
pub mod pipeline;

#[cfg(test)]
mod test_fixtures;

pub use crate::core::{Phase, PipelineConfig, ProcessingStatus, PREVIEW_LIMIT};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutput, RunReport};
