//! Error types for the rendering engine.
//!
//! Only document-level failures surface here. Per-element problems (a bad
//! image, a collapsed table, an unparseable subtree) degrade to placeholders
//! inside the walker and are logged, never propagated.

/// Document-level rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("font setup failed: {0}")]
    Font(String),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("DOCX rendering failed: {0}")]
    Docx(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
