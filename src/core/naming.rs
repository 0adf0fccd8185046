//! Filename parsing: numeric keys and entry classification

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audio::detection::{is_cover_file, is_mp3_file, is_platform_metadata};

/// Three-digit identifier linking an audio file to its cover ("000"-"999")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NumericKey(String);

impl NumericKey {
    /// Build a key from exactly three ASCII digits
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumericKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an archive entry contributes to pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Audio,
    Cover,
    Ignored,
}

/// First run of three consecutive digits anywhere in the entry path
///
/// Longer runs match on their first three digits (`track1234` -> `123`), and
/// directories count: `batch_001/audio.mp3` has key `001`.
pub fn extract_key(path: &str) -> Option<NumericKey> {
    path.as_bytes()
        .windows(3)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .map(|start| NumericKey(path[start..start + 3].to_string()))
}

/// Classify an entry by its lowercased extension
pub fn classify(path: &str) -> FileKind {
    if is_platform_metadata(path) {
        FileKind::Ignored
    } else if is_mp3_file(path) {
        FileKind::Audio
    } else if is_cover_file(path) {
        FileKind::Cover
    } else {
        FileKind::Ignored
    }
}

/// Key plus classification; `None` when the entry takes no part in pairing
pub fn identify(path: &str) -> Option<(NumericKey, FileKind)> {
    match classify(path) {
        FileKind::Ignored => None,
        kind => extract_key(path).map(|key| (key, kind)),
    }
}

/// Output name for a pass-through (or failed) audio entry
pub fn plain_output_name(key: &NumericKey) -> String {
    format!("audio_{}.mp3", key)
}

/// Output name for an audio entry that received its cover
pub fn cover_output_name(key: &NumericKey) -> String {
    format!("audio_{}_with_cover.mp3", key)
}
