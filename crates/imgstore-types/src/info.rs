use serde::{Deserialize, Serialize};

/// Metadata declared by the caller when storing an image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Declared MIME type, e.g. `image/png`. Determines the file extension.
    pub mimetype: String,
}

impl ImageInfo {
    pub fn new(mimetype: impl Into<String>) -> Self {
        Self {
            mimetype: mimetype.into(),
        }
    }

    /// Extension for the declared MIME type, if it is a known one.
    pub fn extension(&self) -> Option<&'static str> {
        mimetype_to_extension(&self.mimetype)
    }
}

// First entry for an extension is the canonical MIME type for it.
const MIME_TABLE: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tiff"),
    ("image/avif", "avif"),
    ("image/x-icon", "ico"),
    ("image/vnd.microsoft.icon", "ico"),
    ("text/plain", "txt"),
];

/// Map a MIME type to the extension used on disk (without the leading dot).
///
/// Parameters (`; charset=...`) are ignored and matching is case-insensitive.
/// Returns `None` for unknown types; such blobs are stored without an
/// extension.
pub fn mimetype_to_extension(mimetype: &str) -> Option<&'static str> {
    let essence = mimetype.split(';').next().unwrap_or_default().trim();
    MIME_TABLE
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// Reverse lookup: canonical MIME type for a file extension.
pub fn extension_to_mimetype(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.');
    let ext = if ext.eq_ignore_ascii_case("jpeg") { "jpg" } else { ext };
    MIME_TABLE
        .iter()
        .find(|(_, e)| e.eq_ignore_ascii_case(ext))
        .map(|(mime, _)| *mime)
}
