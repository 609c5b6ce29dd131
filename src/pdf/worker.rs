//! Render worker - runs in separate thread(s)

use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::cache::BitmapCache;
use super::engine::{CancellationToken, PdfDocument, PdfEngine};
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::source::DocumentSource;
use super::types::RenderedPage;
use crate::error::EngineError;

/// Shared inputs of every worker in a pool
pub struct WorkerContext<E: PdfEngine> {
    pub engine: Arc<E>,
    pub source: Arc<DocumentSource>,
    pub cache: Arc<Mutex<BitmapCache>>,
}

impl<E: PdfEngine> Clone for WorkerContext<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Main worker function - runs in a dedicated thread.
///
/// Opens its own copy of the document. Only the reporting worker tells the
/// service whether opening succeeded.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker<E: PdfEngine>(
    ctx: WorkerContext<E>,
    reports_open: bool,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let doc = match ctx.engine.open(&ctx.source) {
        Ok(doc) => doc,
        Err(error) => {
            if reports_open {
                let _ = responses.send(RenderResponse::OpenFailed { error });
            } else {
                debug!("Worker failed to open document: {error}");
            }
            return;
        }
    };

    if reports_open {
        let _ = responses.send(RenderResponse::Opened {
            page_count: doc.page_count(),
        });
    }

    for request in requests {
        match request {
            RenderRequest::LoadPage { page } => {
                let response = match page_index(&doc, page).and_then(|idx| doc.page_size(idx)) {
                    Ok(size) => RenderResponse::PageLoaded { page, size },
                    Err(error) => RenderResponse::PageLoadFailed { page, error },
                };
                let _ = responses.send(response);
            }

            RenderRequest::RenderPage {
                id,
                page,
                scale,
                cancel,
            } => {
                let response = handle_render_request(&doc, id, page, scale, &cancel, &ctx.cache);
                let _ = responses.send(response);
            }

            RenderRequest::Shutdown => break,
        }
    }
}

fn page_index<D: PdfDocument>(doc: &D, page: usize) -> Result<usize, EngineError> {
    match page.checked_sub(1) {
        Some(idx) if idx < doc.page_count() => Ok(idx),
        _ => Err(EngineError::generic(format!(
            "page {page} out of range (document has {} pages)",
            doc.page_count()
        ))),
    }
}

fn handle_render_request<D: PdfDocument>(
    doc: &D,
    id: RequestId,
    page: usize,
    scale: f32,
    cancel: &CancellationToken,
    cache: &Arc<Mutex<BitmapCache>>,
) -> RenderResponse {
    if cancel.is_cancelled() {
        return RenderResponse::Cancelled { id, page };
    }

    let cached = cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .lookup(page, scale);
    if let Some(data) = cached {
        return RenderResponse::Rendered { id, page, data };
    }

    let result = page_index(doc, page).and_then(|idx| doc.render(idx, scale, cancel));
    match result {
        Ok(bitmap) => {
            let data = cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .store(RenderedPage {
                    page,
                    scale,
                    bitmap,
                });
            RenderResponse::Rendered { id, page, data }
        }
        Err(EngineError::Cancelled) => RenderResponse::Cancelled { id, page },
        Err(error) => {
            warn!("Engine failed to draw page {page}: {error}");
            RenderResponse::RenderFailed { id, page, error }
        }
    }
}
