//! Content type resolution for stored artifacts.

/// Content type used when the fetched one is missing or not an image.
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Picks the content type to store an artifact with.
///
/// The fetched type wins when it names an `image/*` type; media type
/// parameters are dropped. Otherwise `default` is used.
#[must_use]
pub fn resolve_content_type(fetched: Option<&str>, default: &str) -> String {
    fetched
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| value.starts_with("image/") && value.len() > "image/".len())
        .unwrap_or_else(|| default.to_owned())
}

/// Returns the file extension for `content_type`.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}
