//! Test fixtures for archive and tagging tests
//!
//! Everything is generated in memory: MPEG frame runs stand in for MP3 audio,
//! tags are written with `id3`, and archives with `zip`.

#![cfg(test)]

use std::io::{Cursor, Write};

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo, no CRC
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
/// 144 * 128000 / 44100, no padding
const FRAME_LEN: usize = 417;

/// A 1x1 transparent PNG
const TINY_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// `count` silent MPEG frames with no tag
pub fn mp3_frames(count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count * FRAME_LEN);
    for _ in 0..count {
        out.extend_from_slice(&FRAME_HEADER);
        out.resize(out.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    out
}

pub fn png_bytes() -> Vec<u8> {
    TINY_PNG.to_vec()
}

/// MP3 with an ID3v2.4 tag holding the given fields (about one second of audio)
pub fn tagged_mp3(
    title: Option<&str>,
    artist: Option<&str>,
    album: Option<&str>,
    cover: Option<&[u8]>,
) -> Vec<u8> {
    let mut tag = Tag::new();
    if let Some(title) = title {
        tag.set_title(title);
    }
    if let Some(artist) = artist {
        tag.set_artist(artist);
    }
    if let Some(album) = album {
        tag.set_album(album);
    }
    if let Some(cover) = cover {
        tag.add_frame(Picture {
            mime_type: "image/png".to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: cover.to_vec(),
        });
    }

    let mut out = Vec::new();
    tag.write_to(&mut out, Version::Id3v24)
        .expect("Failed to write test tag");
    out.extend_from_slice(&mp3_frames(40));
    out
}

/// MP3 whose ID3v2 header has a size byte that is not syncsafe
pub fn corrupt_tag_mp3() -> Vec<u8> {
    let mut out = b"ID3\x04\x00\x00\x00\x00\x7F\xFF".to_vec();
    out.extend_from_slice(&[0xAB; 64]);
    out.extend_from_slice(&mp3_frames(10));
    out
}

/// Zip the given files in order; names ending in '/' become directories
pub fn build_zip(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, data) in files {
        if name.ends_with('/') {
            writer
                .add_directory(name.to_string(), options)
                .expect("Failed to add directory");
        } else {
            writer
                .start_file(name.to_string(), options)
                .expect("Failed to start file");
            writer.write_all(data).expect("Failed to write file");
        }
    }

    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Overwrite the uncompressed size in the first central directory record
pub fn with_declared_size(mut bytes: Vec<u8>, size: u32) -> Vec<u8> {
    let record = bytes
        .windows(4)
        .position(|w| w == b"PK\x01\x02")
        .expect("No central directory record");
    bytes[record + 24..record + 28].copy_from_slice(&size.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::is_png_data;

    #[test]
    fn test_mp3_frames_layout() {
        let frames = mp3_frames(3);
        assert_eq!(frames.len(), 3 * FRAME_LEN);
        assert_eq!(&frames[FRAME_LEN..FRAME_LEN + 4], &FRAME_HEADER);
    }

    #[test]
    fn test_png_fixture_has_signature() {
        assert!(is_png_data(&png_bytes()));
    }

    #[test]
    fn test_tagged_mp3_starts_with_tag() {
        let bytes = tagged_mp3(Some("t"), None, None, None);
        assert!(bytes.starts_with(b"ID3"));
    }

    #[test]
    fn test_build_zip_signature() {
        let bytes = build_zip(&[("a.txt", b"a".to_vec())]);
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }
}
