//! Raw image-signature detection used when a witness
//! item carries no Ordinal envelope, and by sanitization to
//! locate where real image bytes begin inside a larger payload.

pub const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
pub const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
pub const GIF_MAGIC: &[u8] = &[0x47, 0x49, 0x46, 0x38];
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_MAGIC: &[u8] = b"WEBP";
const FTYP_AVIF: &[u8] = b"ftypavif";
const FTYP_AVIS: &[u8] = b"ftypavis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormat {
    pub tag: &'static str,
    pub mime: &'static str,
}

const PNG: ImageFormat = ImageFormat { tag: "png", mime: "image/png" };
const JPEG: ImageFormat = ImageFormat { tag: "jpeg", mime: "image/jpeg" };
const GIF: ImageFormat = ImageFormat { tag: "gif", mime: "image/gif" };
const WEBP: ImageFormat = ImageFormat { tag: "webp", mime: "image/webp" };
const AVIF: ImageFormat = ImageFormat { tag: "avif", mime: "image/avif" };

fn is_webp_at(bytes: &[u8], offset: usize) -> bool {
    bytes.get(offset..offset + 4) == Some(RIFF_MAGIC) && bytes.get(offset + 8..offset + 12) == Some(WEBP_MAGIC)
}

/// Scans `bytes` for the first occurrence of any recognized image
/// magic signature, returning its format and byte offset. Unlike a
/// plain `starts_with` check, this searches the whole slice so
/// sanitization can truncate a payload down to where the real image
/// begins.
pub fn find_image_signature(bytes: &[u8]) -> Option<(ImageFormat, usize)> {
    let mut best: Option<(ImageFormat, usize)> = None;

    let mut consider = |format: ImageFormat, offset: usize| {
        if best.map(|(_, b)| offset < b).unwrap_or(true) {
            best = Some((format, offset));
        }
    };

    if let Some(offset) = find_subslice(bytes, PNG_MAGIC) {
        consider(PNG, offset);
    }
    if let Some(offset) = find_subslice(bytes, JPEG_MAGIC) {
        consider(JPEG, offset);
    }
    if let Some(offset) = find_subslice(bytes, GIF_MAGIC) {
        consider(GIF, offset);
    }
    if let Some(offset) = find_subslice(bytes, RIFF_MAGIC) {
        if is_webp_at(bytes, offset) {
            consider(WEBP, offset);
        }
    }
    if let Some(offset) = find_subslice(bytes, FTYP_AVIF).or_else(|| find_subslice(bytes, FTYP_AVIS)) {
        // The ftyp box itself starts 4 bytes before the "ftypXXXX"
        // marker (the box's big-endian size field).
        consider(AVIF, offset.saturating_sub(4));
    }

    best
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Whether `bytes` *begins* with a recognized image magic — the
/// cheaper check used on witness items, where a false
/// positive deep inside non-image bytes should not trigger
/// image-inscription extraction.
pub fn starts_with_image_signature(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(PNG_MAGIC) {
        return Some(PNG);
    }
    if bytes.starts_with(JPEG_MAGIC) {
        return Some(JPEG);
    }
    if bytes.starts_with(GIF_MAGIC) {
        return Some(GIF);
    }
    if is_webp_at(bytes, 0) {
        return Some(WEBP);
    }
    if bytes.len() >= 12 && (&bytes[4..] == FTYP_AVIF || bytes[4..].starts_with(FTYP_AVIF) || bytes[4..].starts_with(FTYP_AVIS)) {
        return Some(AVIF);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_at_start() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"rest of file");
        assert_eq!(starts_with_image_signature(&bytes), Some(PNG));
    }

    #[test]
    fn finds_signature_nested_inside_larger_payload() {
        let mut bytes = b"<svg xmlns=...>".to_vec();
        bytes.extend_from_slice(JPEG_MAGIC);
        bytes.extend_from_slice(b"rest");
        let (format, offset) = find_image_signature(&bytes).unwrap();
        assert_eq!(format, JPEG);
        assert_eq!(offset, 15);
    }

    #[test]
    fn webp_requires_webp_marker_at_offset_8() {
        let mut bytes = RIFF_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 4]); // size field
        bytes.extend_from_slice(WEBP_MAGIC);
        assert_eq!(find_image_signature(&bytes).unwrap().0, WEBP);

        let not_webp = b"RIFFxxxxAVI ".to_vec();
        assert!(find_image_signature(&not_webp).is_none());
    }

    #[test]
    fn no_signature_returns_none() {
        assert!(find_image_signature(b"just some text").is_none());
    }
}
