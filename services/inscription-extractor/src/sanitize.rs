//! Payload sanitization rules applied before persisting inscription
//! bytes to disk.

use bitcoin_utils::script::strip_leading_pushdata_prefix;

use crate::image_sig::find_image_signature;

fn is_svg_or_markup(content_type: &str) -> bool {
    content_type.starts_with("image/svg") || content_type.starts_with("text/html")
}

fn is_other_image(content_type: &str) -> bool {
    content_type.starts_with("image/") && !content_type.starts_with("image/svg")
}

/// Trims leading non-printable bytes (outside the printable ASCII
/// range), used by both the SVG/markup path and the generic fallback.
fn trim_leading_non_printable(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| (0x20..=0x7e).contains(&b) || b == b'\n' || b == b'\t');
    match start {
        Some(i) => &bytes[i..],
        None => bytes,
    }
}

/// Applies the content-type-dependent sanitization rules and
/// returns the bytes that should actually be written to disk.
pub fn sanitize_payload(content_type: &str, payload: &[u8]) -> Vec<u8> {
    if is_svg_or_markup(content_type) {
        let stripped = strip_leading_pushdata_prefix(payload);
        let trimmed = trim_leading_non_printable(stripped);
        return match trimmed.iter().position(|&b| b == b'<') {
            Some(0) | None => trimmed.to_vec(),
            Some(i) => trimmed[i..].to_vec(),
        };
    }

    if is_other_image(content_type) {
        return match find_image_signature(payload) {
            Some((_, offset)) => payload[offset..].to_vec(),
            None => payload.to_vec(),
        };
    }

    let stripped = strip_leading_pushdata_prefix(payload);
    trim_leading_non_printable(stripped).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_with_leading_garbage_starts_with_angle_bracket() {
        let mut payload = vec![0x00, 0x01, 0x02];
        payload.extend_from_slice(b"<svg xmlns='...'></svg>");
        let sanitized = sanitize_payload("image/svg+xml", &payload);
        assert_eq!(sanitized[0], b'<');
    }

    #[test]
    fn svg_sanitization_does_not_alter_an_embedded_image_signature() {
        // A recognized image magic hidden inside a larger SVG-labelled
        // payload must survive sanitization untouched.
        let mut payload = b"<svg>".to_vec();
        payload.extend_from_slice(crate::image_sig::PNG_MAGIC);
        payload.extend_from_slice(b"</svg>");
        let sanitized = sanitize_payload("image/svg+xml", &payload);
        assert_eq!(sanitized, payload);
    }

    #[test]
    fn other_image_truncates_to_magic_signature() {
        let mut payload = vec![0xDE, 0xAD, 0xBE, 0xEF];
        payload.extend_from_slice(crate::image_sig::JPEG_MAGIC);
        payload.extend_from_slice(b"rest");
        let sanitized = sanitize_payload("image/jpeg", &payload);
        assert!(sanitized.starts_with(crate::image_sig::JPEG_MAGIC));
    }

    #[test]
    fn generic_content_strips_pushdata_prefix_and_control_bytes() {
        let mut payload = vec![0x05];
        payload.extend_from_slice(b"hello");
        let sanitized = sanitize_payload("text/plain", &payload);
        assert_eq!(sanitized, b"hello");
    }
}
