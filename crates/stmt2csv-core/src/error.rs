use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("statement layout not recognized: {0}")]
    Structural(String),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to read email: {0}")]
    Email(String),

    #[error("unknown adapter '{0}'")]
    UnknownAdapter(String),

    #[error("adapter '{adapter}' does not accept .{extension} files")]
    UnsupportedSource { adapter: String, extension: String },

    #[error("failed to load format from {path}: {reason}")]
    FormatLoad { path: PathBuf, reason: String },

    #[error("invalid format: {0}")]
    FormatInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
