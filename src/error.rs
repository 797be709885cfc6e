//! Structured error types for the proxysheet pipeline.
//!
//! Each pipeline stage has its own variant so the CLI can map failures to
//! distinct exit statuses. The guide-colour variant is the only soft error:
//! the CLI downgrades it to a warning.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by all public proxysheet functions.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The catalog was not valid JSON or did not match the export schema.
    #[error("Failed to parse catalog: {}{}", .source, hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The JSON parsed but a required catalog structure was missing.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    /// An image reference could not be retrieved.
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// Retrieved bytes were not a decodable image.
    #[error("Failed to decode image '{url}': {reason}")]
    Decode { url: String, reason: String },

    /// Compositing or PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Reading the catalog or writing the PDF failed.
    #[error("I/O error on '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cut-guide colour name outside the palette.
    #[error("Unknown cut line colour '{0}'")]
    UnknownColor(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl ProxyError {
    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProxyError::Parse { .. } | ProxyError::Catalog(_) => 2,
            ProxyError::Fetch { .. } => 3,
            ProxyError::Decode { .. } => 4,
            ProxyError::Render(_) => 5,
            ProxyError::Io { .. } => 6,
            // Only reachable from library callers using GuideColor::from_str directly.
            ProxyError::UnknownColor(_) => 7,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't look like a saved-object export. Check for ObjectStates, CustomDeck and ContainedObjects.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ProxyError::Parse { source: e, hint }
    }
}
