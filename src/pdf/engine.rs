//! Rendering engine contract
//!
//! The viewer never touches PDF bytes itself. Everything it needs from a
//! document (page count, page dimensions, rasterized pages) goes through
//! these traits, so any engine can be plugged in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::source::DocumentSource;
use super::types::{Bitmap, PageSize};
use crate::error::EngineError;

/// Cancellation token for cooperative render cancellation
///
/// Clones share state: cancelling any clone cancels all of them.
/// Cancelling is idempotent, and cancelling after the work finished has
/// no effect on the result already produced.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Bail out with [`EngineError::Cancelled`] if cancellation was requested
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Factory for documents.
///
/// Shared between render workers; each worker opens its own document so
/// that engines with thread-bound handles work unchanged.
pub trait PdfEngine: Send + Sync + 'static {
    type Document: PdfDocument;

    /// Open a document from a resolved source
    fn open(&self, source: &DocumentSource) -> Result<Self::Document, EngineError>;

    /// Receive the worker script location configured by the host
    fn configure_worker(&self, _worker_url: &str) {}
}

/// An opened document
pub trait PdfDocument {
    /// Total number of pages
    fn page_count(&self) -> usize;

    /// Page dimensions at scale 1.0 (0-indexed)
    fn page_size(&self, index: usize) -> Result<PageSize, EngineError>;

    /// Draw a page at the given scale (0-indexed).
    ///
    /// Long-running engines should poll `cancel` and return
    /// [`EngineError::Cancelled`] once it trips.
    fn render(
        &self,
        index: usize,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Bitmap, EngineError>;
}
