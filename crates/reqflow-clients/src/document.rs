//! Input document sources
//!
//! Documents are forwarded opaquely to the requirements-extraction worker;
//! the core never parses them itself.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a document's bytes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentBody {
    /// On-disk file, read by the extraction service
    Path(PathBuf),
    /// Inline content supplied directly
    Inline(String),
}

/// One input document for requirements extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub name: String,
    /// MIME type, e.g. "text/markdown" or "application/pdf"
    pub media_type: String,
    pub body: DocumentBody,
}

impl DocumentSource {
    /// Inline text document
    #[must_use]
    pub fn inline(name: impl Into<String>, media_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            body: DocumentBody::Inline(content.into()),
        }
    }

    /// On-disk document
    #[must_use]
    pub fn from_path(name: impl Into<String>, media_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            body: DocumentBody::Path(path.into()),
        }
    }
}
