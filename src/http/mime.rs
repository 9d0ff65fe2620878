//! Content type selection by file extension.
//!
//! Only two types are served: HTML for `.htm`/`.html` files and plain text
//! for everything else. Matching is case-sensitive.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Text,
}

impl ContentType {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("htm") | Some("html") => ContentType::Html,
            _ => ContentType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Text => "text/plain",
        }
    }
}
