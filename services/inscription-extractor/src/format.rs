//! Maps a content-type (or bare image signature) to the short format
//! tag used in `inscriptions.json` and on-disk file names.

use crate::image_sig::ImageFormat;

pub fn format_tag_for_content_type(content_type: &str) -> &'static str {
    let ct = content_type.to_ascii_lowercase();
    if ct.starts_with("image/png") {
        "png"
    } else if ct.starts_with("image/jpeg") || ct.starts_with("image/jpg") {
        "jpeg"
    } else if ct.starts_with("image/gif") {
        "gif"
    } else if ct.starts_with("image/webp") {
        "webp"
    } else if ct.starts_with("image/avif") {
        "avif"
    } else if ct.starts_with("image/svg") {
        "svg"
    } else if ct.starts_with("text/html") {
        "html"
    } else if ct.starts_with("text/plain") {
        "txt"
    } else if ct.contains("brc-20") || ct.contains("brc20") {
        "brc20"
    } else {
        "bin"
    }
}

pub fn extension_for_format(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "jpeg" => "jpg",
        "gif" => "gif",
        "webp" => "webp",
        "avif" => "avif",
        "svg" => "svg",
        "html" => "html",
        "txt" => "txt",
        "brc20" => "json",
        _ => "bin",
    }
}

pub fn format_from_image_signature(format: ImageFormat) -> &'static str {
    format.tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_content_types() {
        assert_eq!(format_tag_for_content_type("text/plain;charset=utf-8"), "txt");
        assert_eq!(format_tag_for_content_type("image/svg+xml"), "svg");
        assert_eq!(format_tag_for_content_type("IMAGE/PNG"), "png");
    }

    #[test]
    fn unknown_content_type_falls_back_to_bin() {
        assert_eq!(format_tag_for_content_type("application/octet-stream"), "bin");
    }
}
