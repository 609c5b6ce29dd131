//! Render service - manages the worker pool and bitmap cache for one document

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error};

use super::cache::{BitmapCache, CacheStats};
use super::engine::PdfEngine;
use super::page::RenderTask;
use super::request::{RenderRequest, RenderResponse};
use super::source::DocumentSource;
use super::types::RenderedPage;
use super::worker::{WorkerContext, render_worker};
use crate::error::{EngineError, ViewerError};

/// Worker pool sizing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub workers: usize,
    pub cache_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: super::DEFAULT_WORKERS,
            cache_size: super::DEFAULT_CACHE_SIZE,
        }
    }
}

/// Runs engine calls for one document off the caller's thread.
///
/// Dropping the service shuts its workers down; responses still queued for
/// a dropped service are never observed.
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    cache: Arc<Mutex<BitmapCache>>,
    num_workers: usize,
    in_flight: usize,
}

impl RenderService {
    /// Spawn workers that open `source` with `engine`
    pub fn spawn<E: PdfEngine>(
        engine: Arc<E>,
        source: DocumentSource,
        config: ServiceConfig,
    ) -> Result<Self, ViewerError> {
        let cache = Arc::new(Mutex::new(BitmapCache::new(config.cache_size)));

        // flume gives us MPMC: every worker pulls from the same request queue.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let ctx = WorkerContext {
            engine,
            source: Arc::new(source),
            cache: Arc::clone(&cache),
        };

        let num_workers = config.workers.max(1);
        let mut spawned = 0;
        for n in 0..num_workers {
            let ctx = ctx.clone();
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            let reports_open = spawned == 0;

            let result = std::thread::Builder::new()
                .name(format!("pdfpane-render-{n}"))
                .spawn(move || render_worker(ctx, reports_open, rx, tx));

            match result {
                Ok(_) => spawned += 1,
                Err(e) => error!("Failed to spawn render worker {n}: {e}"),
            }
        }

        if spawned == 0 {
            return Err(ViewerError::DocumentLoad(EngineError::generic(
                "no render worker could be started",
            )));
        }
        debug!("Render service started with {spawned} workers");

        Ok(Self {
            request_tx,
            response_rx,
            cache,
            num_workers: spawned,
            // The open report is always owed by the first worker
            in_flight: 1,
        })
    }

    /// Ask for page metadata
    pub fn load_page(&mut self, page: usize) {
        self.send(RenderRequest::LoadPage { page });
    }

    /// Submit a render task
    pub fn render(&mut self, task: &RenderTask) {
        self.send(RenderRequest::RenderPage {
            id: task.id,
            page: task.page,
            scale: task.scale,
            cancel: task.token.clone(),
        });
    }

    fn send(&mut self, request: RenderRequest) {
        if self.request_tx.send(request).is_ok() {
            self.in_flight += 1;
        }
    }

    /// Take one response if available
    pub fn try_recv(&mut self) -> Option<RenderResponse> {
        let response = self.response_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(response)
    }

    /// Wait up to `timeout` for a response
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<RenderResponse> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(response)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // Every worker is gone, nothing else will arrive
                self.in_flight = 0;
                None
            }
        }
    }

    /// Number of requests still owed a response
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .stats()
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        let stats = self.cache_stats();
        debug!(
            "Render service stopping: {} cache hits, {} misses",
            stats.hits, stats.misses
        );
        self.shutdown();
    }
}
