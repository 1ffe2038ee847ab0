pub const RECOGNIZED_IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
    "image/gif",
];

pub fn is_recognized_image_mime(mime_type: &str) -> bool {
    RECOGNIZED_IMAGE_MIME_TYPES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(mime_type.trim()))
}

/// Sniffs the image format from its magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, 0x68, 0x65, 0x69, _, ..] => Some("image/heic"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, 0x6D, 0x69, 0x66, 0x31, ..] => Some("image/heif"),
        _ => {
            tracing::debug!(
                "Unrecognized image format (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(
            detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
    }

    #[test]
    fn test_detect_gif() {
        assert_eq!(detect_image_mime(b"GIF89a"), Some("image/gif"));
    }

    #[test]
    fn test_detect_heic() {
        assert_eq!(
            detect_image_mime(b"\x00\x00\x00\x18ftypheic"),
            Some("image/heic")
        );
    }

    #[test]
    fn test_unknown_is_none() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_recognized_mime_types() {
        assert!(is_recognized_image_mime("image/jpeg"));
        assert!(is_recognized_image_mime("IMAGE/PNG"));
        assert!(!is_recognized_image_mime("image/x-unknown"));
        assert!(!is_recognized_image_mime("application/pdf"));
        assert!(!is_recognized_image_mime(""));
    }
}
