//! Render request and response types

use std::sync::Arc;

use super::engine::CancellationToken;
use super::types::{PageSize, RenderedPage};
use crate::error::EngineError;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to render workers. Page numbers are 1-based.
#[derive(Debug)]
pub enum RenderRequest {
    /// Fetch page dimensions at scale 1.0
    LoadPage { page: usize },

    /// Draw a page at a scale
    RenderPage {
        id: RequestId,
        page: usize,
        scale: f32,
        cancel: CancellationToken,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from render workers
#[derive(Debug)]
pub enum RenderResponse {
    /// The document opened (sent once per service)
    Opened { page_count: usize },

    /// The document could not be opened
    OpenFailed { error: EngineError },

    /// Page metadata is available
    PageLoaded { page: usize, size: PageSize },

    /// Page metadata could not be fetched
    PageLoadFailed { page: usize, error: EngineError },

    /// Rendered page data
    Rendered {
        id: RequestId,
        page: usize,
        data: Arc<RenderedPage>,
    },

    /// The request was cancelled before or during the draw
    Cancelled { id: RequestId, page: usize },

    /// Error during rendering
    RenderFailed {
        id: RequestId,
        page: usize,
        error: EngineError,
    },
}
