//! Error types for the viewer and the rendering engine

/// Errors raised by a rendering engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("render cancelled")]
    Cancelled,

    #[error("{detail}")]
    Generic { detail: String },
}

impl EngineError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Errors surfaced by the viewer
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The document source could not be turned into something the engine can open
    #[error("malformed document source: {detail}")]
    SourceResolution { detail: String },

    /// The engine failed to open or parse the document
    #[error("failed to load document: {0}")]
    DocumentLoad(#[source] EngineError),

    /// A single page failed to load or draw
    #[error("page {page} failed to render: {detail}")]
    PageRender { page: usize, detail: String },

    #[error("invalid settings: {detail}")]
    Config { detail: String },
}

impl ViewerError {
    pub fn source_resolution(msg: impl Into<String>) -> Self {
        Self::SourceResolution { detail: msg.into() }
    }

    pub fn page_render(page: usize, msg: impl Into<String>) -> Self {
        Self::PageRender {
            page,
            detail: msg.into(),
        }
    }

    /// True for failures scoped to one page rather than the whole document
    #[must_use]
    pub fn is_page_scoped(&self) -> bool {
        matches!(self, Self::PageRender { .. })
    }
}
