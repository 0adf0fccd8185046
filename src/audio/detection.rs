use std::path::Path;

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn lowercase_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Check if an archive entry is an MP3 based on its extension
pub fn is_mp3_file(path: &str) -> bool {
    lowercase_extension(path).as_deref() == Some("mp3")
}

/// Check if an archive entry is a cover image based on its extension
pub fn is_cover_file(path: &str) -> bool {
    lowercase_extension(path).as_deref() == Some("png")
}

/// macOS zip tooling adds `__MACOSX/` trees and `._name` AppleDouble files,
/// at any depth
pub fn is_platform_metadata(path: &str) -> bool {
    let mut segments = path.split(['/', '\\']).peekable();
    while let Some(segment) = segments.next() {
        let is_dir = segments.peek().is_some();
        if (is_dir && segment == "__MACOSX") || (!is_dir && segment.starts_with("._")) {
            return true;
        }
    }
    false
}

/// Check whether image bytes carry the PNG signature
pub fn is_png_data(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}
