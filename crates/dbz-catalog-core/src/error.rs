//! Error types for catalog sources and character drafts.

use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A single rejected draft field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Errors raised by the API clients, configuration and draft validation.
/// The list pipeline itself never fails.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {0}: {1}")]
    Status(u16, String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("invalid character draft: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}
