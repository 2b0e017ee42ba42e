//! Error types for Anki MCP Server

use thiserror::Error;

/// Result type alias for Anki MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Anki MCP Server
#[derive(Error, Debug)]
pub enum Error {
    /// Input artifact does not resolve to a readable file
    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    /// Input artifact cannot be parsed as a Docling document
    #[error("Malformed input {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    /// Extraction produced no sections; reported as a skip
    #[error("No sections extracted from {path}")]
    EmptyExtraction { path: String },

    /// AnkiConnect answered with an error
    #[error("AnkiConnect error: {reason}")]
    AnkiConnect { reason: String },

    /// AnkiConnect could not be reached
    #[error("Failed to connect to Anki at {url}")]
    AnkiUnavailable { url: String },

    /// Batch sources expanded to zero artifacts
    #[error("No Docling JSON inputs found in {sources}")]
    NoInputs { sources: String },

    /// Note lookup returned nothing
    #[error("Note not found: {id}")]
    NoteNotFound { id: i64 },

    /// Tool arguments rejected before reaching Anki
    #[error("Invalid parameters: {reason}")]
    InvalidParams { reason: String },

    /// Resource URI not served by this server
    #[error("Unknown resource URI: {uri}")]
    UnknownResource { uri: String },

    /// Background task panicked or was cancelled
    #[error("Task join error: {reason}")]
    Task { reason: String },

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::InputNotFound { .. } => "Source file not found".to_string(),
            Error::MalformedInput { reason, .. } => {
                format!("Source file is not a valid Docling document: {}", reason)
            }
            Error::EmptyExtraction { .. } => "No sections found".to_string(),
            Error::AnkiConnect { reason } => format!("Anki Error: {}", reason),
            Error::AnkiUnavailable { url } => format!(
                "Failed to connect to Anki. Please ensure:\n\
                 1. Anki is running\n\
                 2. AnkiConnect add-on is installed\n\
                 3. AnkiConnect is listening on {}",
                url
            ),
            Error::NoInputs { .. } => "No Docling JSON inputs found".to_string(),
            Error::NoteNotFound { id } => format!("Note not found: {}", id),
            Error::InvalidParams { reason } => format!("Invalid parameters: {}", reason),
            Error::UnknownResource { uri } => format!("Unknown resource URI: {}", uri),
            Error::Task { .. } => "Internal task failed".to_string(),
            Error::HttpRequest(_) => "HTTP request failed".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
        }
    }

    /// Whether this error only signals that nothing was extractable.
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::EmptyExtraction { .. })
    }
}
