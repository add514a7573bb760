//! HTML-to-paginated-document transcription engine.
//!
//! Converts the constrained rich-text HTML produced by the report editor
//! into themed, paginated PDF and DOCX documents. One depth-first tree walk
//! ([`walker`]) feeds both output formats through the [`RenderBackend`]
//! abstraction; malformed input (collapsed tables, stray Unicode, markdown
//! artifacts) is normalized on the way through rather than rejected.
//!
//! ```no_run
//! use reportstudio_engine::{assembly, docx::DocxBackend, RenderRequest};
//!
//! let request: RenderRequest = serde_json::from_str("{}").unwrap();
//! let mut backend = DocxBackend::new(&request.config);
//! assembly::render_document(&request, &mut backend);
//! let bytes = backend.finish().unwrap();
//! ```

pub mod assembly;
pub mod docx;
pub mod dom;
pub mod element;
pub mod error;
pub mod image;
pub mod markdown;
pub mod pdf;
pub mod sanitize;
pub mod table;
pub mod types;
pub mod walker;

pub use element::{ListEntry, PlacedImage, RenderBackend, TableGrid, TextRun, TocEntry};
pub use error::{EngineError, Result};
pub use types::{
    BlockKind, DocumentConfig, ImageAsset, Margins, RenderRequest, ReportPayload, Theme,
};
