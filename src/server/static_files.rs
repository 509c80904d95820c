//! Static asset loading from the document root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::fs;

use crate::server::mime::is_binary;
use crate::server::response::Body;

/// Reads whole assets from under a document root.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the asset at `path` in full.
    ///
    /// Binary content types come back as [`Body::Binary`], everything else as
    /// [`Body::Text`]. Returns `None` when the file is missing, is not a
    /// regular file, or resolves outside the document root.
    pub async fn read(&self, path: &Path, content_type: &str) -> Option<Body> {
        let root = match fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) => {
                warn!("Document root {} is not accessible: {e}", self.root.display());
                return None;
            }
        };

        // Missing files are the common 404, not worth more than a debug line.
        let file = match fs::canonicalize(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                debug!("Cannot resolve {}: {e}", path.display());
                return None;
            }
        };

        if !file.starts_with(&root) {
            warn!("Refusing {}: outside document root", path.display());
            return None;
        }

        match fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            _ => return None,
        }

        let bytes = match fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {e}", file.display());
                return None;
            }
        };

        if is_binary(content_type) {
            Some(Body::Binary(bytes))
        } else {
            let text = String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
            Some(Body::Text(text))
        }
    }
}
