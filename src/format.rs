//! Preview strategy selection for a stored asset.
//!
//! Classification is by declared filename suffix -- remote names may lack
//! any content negotiation, so the suffix path must always be available.
//! Magic-byte sniffing is offered as a secondary check for callers that
//! already hold the payload.

/// How an asset can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Conventional photographic format a display surface shows natively.
    DirectImage,
    /// Gridded raster format that needs the decode pipeline.
    ScientificRaster,
    /// No preview; download-only affordance.
    Unsupported,
}

/// Classify by filename suffix, case-insensitive.
///
/// `.jpg`/`.jpeg`/`.png` -> [`PreviewKind::DirectImage`],
/// `.tif`/`.tiff` -> [`PreviewKind::ScientificRaster`], anything else
/// (including a missing name) -> [`PreviewKind::Unsupported`].
#[must_use]
pub fn classify(filename: &str) -> PreviewKind {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png") {
        PreviewKind::DirectImage
    } else if lower.ends_with(".tif") || lower.ends_with(".tiff") {
        PreviewKind::ScientificRaster
    } else {
        PreviewKind::Unsupported
    }
}

/// Inspect the payload's leading bytes. Returns `None` when the signature
/// is not one we recognize; the suffix classification stays authoritative.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<PreviewKind> {
    if bytes.len() < 4 {
        return None;
    }
    match &bytes[0..4] {
        // TIFF: byte-order mark then version 42
        [b'I', b'I', 0x2A, 0x00] | [b'M', b'M', 0x00, 0x2A] => {
            Some(PreviewKind::ScientificRaster)
        }
        [0x89, b'P', b'N', b'G'] => Some(PreviewKind::DirectImage),
        [0xFF, 0xD8, 0xFF, _] => Some(PreviewKind::DirectImage),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_classification() {
        assert_eq!(classify("scan.tif"), PreviewKind::ScientificRaster);
        assert_eq!(classify("ortho.TIFF"), PreviewKind::ScientificRaster);
        assert_eq!(classify("photo.jpg"), PreviewKind::DirectImage);
        assert_eq!(classify("photo.JPEG"), PreviewKind::DirectImage);
        assert_eq!(classify("shot.png"), PreviewKind::DirectImage);
        assert_eq!(classify("archive.zip"), PreviewKind::Unsupported);
        assert_eq!(classify("noextension"), PreviewKind::Unsupported);
        assert_eq!(classify(""), PreviewKind::Unsupported);
    }

    #[test]
    fn suffix_must_be_terminal() {
        // "tif" appearing mid-name is not a match
        assert_eq!(classify("tif_notes.txt"), PreviewKind::Unsupported);
    }

    #[test]
    fn sniff_recognizes_tiff_both_byte_orders() {
        assert_eq!(
            sniff(&[b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]),
            Some(PreviewKind::ScientificRaster)
        );
        assert_eq!(
            sniff(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]),
            Some(PreviewKind::ScientificRaster)
        );
    }

    #[test]
    fn sniff_unknown_or_short_is_none() {
        assert_eq!(sniff(b"GIF8"), None);
        assert_eq!(sniff(b"II"), None);
    }
}
