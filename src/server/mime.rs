//! Extension to Content-Type resolution.

use std::collections::HashMap;

/// Content type reported for names whose extension is not in the table.
///
/// The router treats a name resolving to this fallback as a handler name.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

/// Content types whose assets are served as raw bytes. Every other known type
/// is read and served as text.
pub const BINARY_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "video/mp4"];

const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("wmv", "video/x-ms-wmv"),
];

/// Returns true if assets of this type must be served byte-for-byte.
pub fn is_binary(content_type: &str) -> bool {
    BINARY_CONTENT_TYPES.contains(&content_type)
}

/// Table mapping file extensions to content types.
///
/// # Examples
/// ```
/// use firefly_http::ContentTypes;
///
/// let types = ContentTypes::default().with_type("wasm", "application/wasm");
/// assert_eq!(types.lookup("photo.png"), Some("image/png"));
/// assert_eq!(types.lookup("module.wasm"), Some("application/wasm"));
/// assert_eq!(types.lookup("greet"), None);
/// assert_eq!(types.content_type("greet"), "text/plain");
/// ```
#[derive(Debug, Clone)]
pub struct ContentTypes {
    by_extension: HashMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        DEFAULT_TYPES
            .iter()
            .fold(Self::empty(), |types, (extension, content_type)| types.with_type(*extension, *content_type))
    }
}

impl ContentTypes {
    /// A table with no entries; every name resolves to the fallback.
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Add or replace the content type for an extension (without the dot).
    ///
    /// Mapping an extension to [`FALLBACK_CONTENT_TYPE`] makes names with it
    /// handler calls rather than static assets.
    pub fn with_type(mut self, extension: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.by_extension
            .insert(extension.into().to_ascii_lowercase(), content_type.into());
        self
    }

    /// The content type for the extension after the last `.` of `file_name`.
    pub fn lookup(&self, file_name: &str) -> Option<&str> {
        let (_, extension) = file_name.rsplit_once('.')?;
        self.by_extension
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Like [`ContentTypes::lookup`], falling back to [`FALLBACK_CONTENT_TYPE`].
    pub fn content_type(&self, file_name: &str) -> &str {
        self.lookup(file_name).unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        let types = ContentTypes::default();
        assert_eq!(types.lookup("index.html"), Some("text/html"));
        assert_eq!(types.lookup("site.css"), Some("text/css"));
        assert_eq!(types.lookup("app.js"), Some("application/javascript"));
        assert_eq!(types.lookup("data.json"), Some("application/json"));
        assert_eq!(types.lookup("photo.jpg"), Some("image/jpeg"));
        assert_eq!(types.lookup("clip.mp4"), Some("video/mp4"));
    }

    #[test]
    fn test_extension_is_case_insensitive_and_last_dot_wins() {
        let types = ContentTypes::default();
        assert_eq!(types.lookup("PHOTO.PNG"), Some("image/png"));
        assert_eq!(types.lookup("archive.html.png"), Some("image/png"));
    }

    #[test]
    fn test_unknown_extension() {
        let types = ContentTypes::default();
        assert_eq!(types.lookup("greet"), None);
        assert_eq!(types.lookup("report.xyz"), None);
        assert_eq!(types.content_type("report.xyz"), FALLBACK_CONTENT_TYPE);
        assert_eq!(ContentTypes::empty().lookup("index.html"), None);
    }

    #[test]
    fn test_binary_kinds() {
        assert!(is_binary("image/png"));
        assert!(is_binary("image/jpeg"));
        assert!(is_binary("video/mp4"));
        assert!(!is_binary("video/quicktime"));
        assert!(!is_binary("text/html"));
    }
}
