//! Cover art embedding for MP3 entries
//!
//! Only the leading ID3v2 tag is rewritten. Everything after it (MPEG frames,
//! a trailing ID3v1 tag, anything else) is copied through byte for byte.

use std::io::Cursor;

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};

use crate::core::NumericKey;
use crate::error::{EmbedError, EmbedFailure};

/// Cover images are accepted as PNG only
pub const COVER_MIME_TYPE: &str = "image/png";

const HEADER_LEN: usize = 10;
const FOOTER_LEN: usize = 10;
const FLAG_FOOTER: u8 = 0x10;

/// Byte length of the leading ID3v2 tag including header and footer
///
/// Returns 0 when the buffer does not start with an ID3v2 tag.
pub fn id3v2_tag_len(bytes: &[u8]) -> Result<usize, EmbedFailure> {
    if !bytes.starts_with(b"ID3") {
        return Ok(0);
    }
    if bytes.len() < HEADER_LEN {
        return Err(EmbedFailure::TruncatedTag {
            declared: HEADER_LEN,
            available: bytes.len(),
        });
    }

    let header = &bytes[..HEADER_LEN];
    // version and revision bytes are never 0xFF; size bytes are syncsafe
    if header[3] == 0xFF || header[4] == 0xFF || header[6..].iter().any(|b| b & 0x80 != 0) {
        return Err(EmbedFailure::MalformedHeader);
    }

    let body_len = header[6..]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | usize::from(b));
    let footer_len = if header[5] & FLAG_FOOTER != 0 { FOOTER_LEN } else { 0 };
    let declared = HEADER_LEN + body_len + footer_len;

    if declared > bytes.len() {
        return Err(EmbedFailure::TruncatedTag {
            declared,
            available: bytes.len(),
        });
    }
    Ok(declared)
}

/// The bytes following the leading ID3v2 tag
pub fn audio_payload(bytes: &[u8]) -> Result<&[u8], EmbedFailure> {
    let tag_len = id3v2_tag_len(bytes)?;
    Ok(&bytes[tag_len..])
}

fn write_cover(audio: &[u8], image: &[u8]) -> Result<Vec<u8>, EmbedFailure> {
    let tag_len = id3v2_tag_len(audio)?;
    let mut tag = if tag_len == 0 {
        Tag::new()
    } else {
        Tag::read_from2(Cursor::new(&audio[..tag_len]))?
    };

    // v2.3 stays v2.3 for older players; everything else is written as v2.4
    let version = match tag.version() {
        Version::Id3v23 => Version::Id3v23,
        _ => Version::Id3v24,
    };

    tag.remove_all_pictures();
    tag.add_frame(Picture {
        mime_type: COVER_MIME_TYPE.to_string(),
        picture_type: PictureType::CoverFront,
        description: String::new(),
        data: image.to_vec(),
    });

    let payload = &audio[tag_len..];
    let mut out = Vec::with_capacity(image.len() + payload.len() + 1024);
    tag.write_to(&mut out, version)?;
    out.extend_from_slice(payload);
    Ok(out)
}

/// Embed `image` as the front cover of an MP3, replacing any existing pictures
///
/// The image is stored verbatim. Fails when the existing tag cannot be
/// parsed or the new one cannot be written.
pub fn embed_cover(key: &NumericKey, audio: &[u8], image: &[u8]) -> Result<Vec<u8>, EmbedError> {
    write_cover(audio, image).map_err(|source| EmbedError {
        key: key.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{corrupt_tag_mp3, mp3_frames, png_bytes, tagged_mp3};

    fn key() -> NumericKey {
        NumericKey::parse("001").unwrap()
    }

    fn read_tag(bytes: &[u8]) -> Tag {
        Tag::read_from2(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_tag_len_absent() {
        assert_eq!(id3v2_tag_len(&mp3_frames(2)).unwrap(), 0);
        assert_eq!(id3v2_tag_len(&[]).unwrap(), 0);
    }

    #[test]
    fn test_tag_len_with_footer() {
        let mut bytes = b"ID3\x04\x00\x10\x00\x00\x00\x05".to_vec();
        bytes.extend_from_slice(&[0u8; 5]);
        bytes.extend_from_slice(b"3DI\x04\x00\x10\x00\x00\x00\x05");
        bytes.extend_from_slice(b"payload");
        assert_eq!(id3v2_tag_len(&bytes).unwrap(), 25);
        assert_eq!(audio_payload(&bytes).unwrap(), b"payload");
    }

    #[test]
    fn test_tag_len_syncsafe_size() {
        // 0x01 0x7F -> 255 bytes
        let mut bytes = b"ID3\x04\x00\x00\x00\x00\x01\x7F".to_vec();
        bytes.extend_from_slice(&[0u8; 255]);
        assert_eq!(id3v2_tag_len(&bytes).unwrap(), 265);
    }

    #[test]
    fn test_tag_len_rejects_malformed() {
        assert!(matches!(
            id3v2_tag_len(&corrupt_tag_mp3()),
            Err(EmbedFailure::MalformedHeader)
        ));
        assert!(matches!(
            id3v2_tag_len(b"ID3\x04"),
            Err(EmbedFailure::TruncatedTag { .. })
        ));

        let mut truncated = b"ID3\x04\x00\x00\x00\x00\x10\x00".to_vec();
        truncated.extend_from_slice(&[0u8; 100]);
        assert!(matches!(
            id3v2_tag_len(&truncated),
            Err(EmbedFailure::TruncatedTag { declared: 2058, available: 110 })
        ));
    }

    #[test]
    fn test_embed_into_untagged_audio() {
        let audio = mp3_frames(40);
        let cover = png_bytes();

        let out = embed_cover(&key(), &audio, &cover).unwrap();
        assert!(out.starts_with(b"ID3"));
        assert_eq!(audio_payload(&out).unwrap(), audio.as_slice());

        let tag = read_tag(&out);
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].mime_type, COVER_MIME_TYPE);
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);
        assert_eq!(pictures[0].data, cover);
    }

    #[test]
    fn test_embed_replaces_existing_cover() {
        let old_cover = png_bytes();
        let mut new_cover = png_bytes();
        new_cover.extend_from_slice(b"newer");

        let audio = tagged_mp3(Some("Song"), Some("Band"), None, Some(&old_cover));
        let out = embed_cover(&key(), &audio, &new_cover).unwrap();

        let tag = read_tag(&out);
        let pictures: Vec<_> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].data, new_cover);
        assert_eq!(tag.title(), Some("Song"));
        assert_eq!(tag.artist(), Some("Band"));
    }

    #[test]
    fn test_embed_preserves_payload_of_tagged_audio() {
        let audio = tagged_mp3(Some("Song"), None, None, None);
        let out = embed_cover(&key(), &audio, &png_bytes()).unwrap();

        assert_eq!(
            audio_payload(&out).unwrap(),
            audio_payload(&audio).unwrap()
        );
    }

    #[test]
    fn test_embed_keeps_trailing_id3v1() {
        let mut audio = mp3_frames(4);
        let mut v1 = b"TAG".to_vec();
        v1.resize(128, 0);
        audio.extend_from_slice(&v1);

        let out = embed_cover(&key(), &audio, &png_bytes()).unwrap();
        assert!(out.ends_with(&v1));
    }

    #[test]
    fn test_embed_keeps_id3v23() {
        let mut tag = Tag::new();
        tag.set_title("Old");
        let mut audio = Vec::new();
        tag.write_to(&mut audio, Version::Id3v23).unwrap();
        audio.extend_from_slice(&mp3_frames(4));

        let out = embed_cover(&key(), &audio, &png_bytes()).unwrap();
        assert_eq!(out[3], 3);
        assert_eq!(read_tag(&out).title(), Some("Old"));
    }

    #[test]
    fn test_embed_fails_on_corrupt_tag() {
        let err = embed_cover(&key(), &corrupt_tag_mp3(), &png_bytes()).unwrap_err();
        assert_eq!(err.key, key());
        assert!(matches!(err.source, EmbedFailure::MalformedHeader));
    }
}
