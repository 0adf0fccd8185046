// Audio module - contains entry detection, metadata reading, and cover embedding

pub mod cover;
pub mod detection;
pub mod metadata;

pub use cover::{audio_payload, embed_cover, id3v2_tag_len, COVER_MIME_TYPE};
pub use detection::{is_cover_file, is_mp3_file, is_png_data};
pub use metadata::{analyze, format_duration, try_analyze, AnalyzeError, AudioMetadata, PreviewEntry};
