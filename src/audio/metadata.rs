use std::io::Cursor;

use lofty::error::LoftyError;
use lofty::{Accessor, AudioFile, Probe, TaggedFileExt};
use serde::Serialize;
use thiserror::Error;

/// Tag fields read from an audio entry; never written back
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: Option<f64>,
    pub has_embedded_cover: bool,
}

impl AudioMetadata {
    /// Whether any descriptive text field was found
    pub fn has_metadata(&self) -> bool {
        self.title.is_some() || self.artist.is_some() || self.album.is_some()
    }

    /// Duration as "m:ss"
    pub fn duration_display(&self) -> Option<String> {
        self.duration_seconds.map(format_duration)
    }
}

/// Why metadata could not be read; callers fold this into "no metadata"
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tag error: {0}")]
    Lofty(#[from] LoftyError),

    #[error("no tag present")]
    NoTag,
}

/// Format whole seconds as "m:ss"
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}", mins, secs)
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read title, artist, album, duration and cover presence from audio bytes
pub fn try_analyze(bytes: &[u8]) -> Result<AudioMetadata, AnalyzeError> {
    let tagged_file = Probe::new(Cursor::new(bytes)).guess_file_type()?.read()?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .ok_or(AnalyzeError::NoTag)?;

    let duration = tagged_file.properties().duration();
    let duration_seconds = if duration.is_zero() {
        None
    } else {
        Some(duration.as_secs_f64())
    };

    Ok(AudioMetadata {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        duration_seconds,
        has_embedded_cover: tag.picture_count() > 0,
    })
}

/// Like [`try_analyze`], but any failure yields empty metadata
pub fn analyze(bytes: &[u8]) -> AudioMetadata {
    match try_analyze(bytes) {
        Ok(metadata) => metadata,
        Err(e) => {
            log::debug!("No metadata available: {}", e);
            AudioMetadata::default()
        }
    }
}

/// One row of the pre-embedding preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewEntry {
    pub filename: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: Option<f64>,
    /// "m:ss"
    pub duration: Option<String>,
    pub has_metadata: bool,
    /// The audio already carries a picture
    pub has_embedded_cover: bool,
    /// A matching cover was found in the archive
    pub has_cover: bool,
}

impl PreviewEntry {
    pub fn new(filename: impl Into<String>, metadata: AudioMetadata, has_cover: bool) -> Self {
        Self {
            filename: filename.into(),
            duration: metadata.duration_display(),
            has_metadata: metadata.has_metadata(),
            has_embedded_cover: metadata.has_embedded_cover,
            title: metadata.title,
            artist: metadata.artist,
            album: metadata.album,
            duration_seconds: metadata.duration_seconds,
            has_cover,
        }
    }
}
