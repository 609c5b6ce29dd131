//! Per-page load/render state machine
//!
//! Each page moves `Unloaded -> Loading -> Loaded -> Rendering -> Rendered`.
//! A scale change sends a rendering or rendered page back to `Rendering`
//! after cancelling whatever draw was in flight, so at most one render
//! task per page is ever active and completions land in submission order.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use log::{debug, warn};

use super::engine::CancellationToken;
use super::request::RequestId;
use super::types::{PageSize, VecExt};
use crate::error::ViewerError;

/// Lifecycle of a single page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PageStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Rendering,
    Rendered,
}

/// Per-page record
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub status: PageStatus,
    /// Dimensions at scale 1.0, known once loaded
    pub size: Option<PageSize>,
    /// Last reported visibility in 0..=1
    pub visibility_ratio: f32,
    /// Scale of the last completed draw
    pub rendered_scale: Option<f32>,
    /// Last load or render failure
    pub last_error: Option<String>,
}

impl Page {
    pub fn loaded(&self) -> bool {
        self.status >= PageStatus::Loaded
    }

    pub fn rendered(&self) -> bool {
        self.status == PageStatus::Rendered
    }

    /// A load or draw failed; the page stays as it is until the next document load
    pub fn failed(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn landscape(&self) -> bool {
        self.size.is_some_and(PageSize::is_landscape)
    }
}

/// Handle for one in-flight page draw
#[derive(Clone, Debug)]
pub struct RenderTask {
    pub id: RequestId,
    /// Page number (1-based)
    pub page: usize,
    pub scale: f32,
    pub token: CancellationToken,
}

impl RenderTask {
    /// Cancel the draw; a no-op once it has completed
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Outcome of applying a render completion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The result belongs to the page's active task
    Applied,
    /// Superseded or unknown task; the result must be dropped
    Stale,
}

/// Owns page records and the active render task of each page
#[derive(Debug)]
pub struct RenderController {
    pages: Vec<Page>,
    active: HashMap<usize, RenderTask>,
    next_task_id: u64,
}

impl Default for RenderController {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            active: HashMap::new(),
            next_task_id: 1,
        }
    }

    /// Replace all records with `page_count` unloaded pages
    pub fn reset(&mut self, page_count: usize) {
        for task in self.active.values() {
            task.cancel();
        }
        self.active.clear();
        self.pages.reset_to_len(page_count);
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    #[must_use]
    pub fn page(&self, page: usize) -> Option<&Page> {
        page.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut Page, ViewerError> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|idx| self.pages.get_mut(idx))
            .ok_or_else(|| {
                ViewerError::page_render(page, format!("out of range (document has {count} pages)"))
            })
    }

    /// Mark a page as loading.
    ///
    /// Returns `true` when the caller must fetch page metadata. Repeat calls
    /// for a page that is already loading or loaded return `false`.
    pub fn begin_load(&mut self, page: usize) -> Result<bool, ViewerError> {
        let record = self.page_mut(page)?;
        if record.status != PageStatus::Unloaded || record.failed() {
            return Ok(false);
        }
        record.status = PageStatus::Loading;
        Ok(true)
    }

    /// Record page metadata. Ignored unless the page is loading.
    pub fn finish_load(&mut self, page: usize, size: PageSize) -> Result<(), ViewerError> {
        let record = self.page_mut(page)?;
        if record.status != PageStatus::Loading {
            debug!("Ignoring load result for page {page} in state {:?}", record.status);
            return Ok(());
        }
        record.status = PageStatus::Loaded;
        record.size = Some(size);
        record.last_error = None;
        Ok(())
    }

    /// Record that page metadata could not be fetched. The page stays
    /// unloaded and is not requested again.
    pub fn fail_load(&mut self, page: usize, detail: &str) -> ViewerError {
        match self.page_mut(page) {
            Ok(record) => {
                record.status = PageStatus::Unloaded;
                record.last_error = Some(detail.to_string());
                ViewerError::page_render(page, detail)
            }
            Err(e) => e,
        }
    }

    /// Issue a new render task for a loaded page, cancelling the previous one
    pub fn begin_render(&mut self, page: usize, scale: f32) -> Result<RenderTask, ViewerError> {
        let record = self.page_mut(page)?;
        if !record.loaded() {
            return Err(ViewerError::page_render(page, "page is not loaded yet"));
        }
        if let Some(detail) = &record.last_error {
            return Err(ViewerError::page_render(page, format!("earlier failure: {detail}")));
        }
        record.status = PageStatus::Rendering;

        if let Some(previous) = self.active.remove(&page) {
            debug!(
                "Cancelling render {:?} of page {page} at scale {}",
                previous.id, previous.scale
            );
            previous.cancel();
        }

        let task = RenderTask {
            id: self.next_id(),
            page,
            scale,
            token: CancellationToken::new(),
        };
        self.active.insert(page, task.clone());
        Ok(task)
    }

    /// Apply a successful draw if it belongs to the active task
    pub fn finish_render(&mut self, id: RequestId, page: usize) -> Completion {
        let Some(scale) = self.take_active(id, page) else {
            return Completion::Stale;
        };
        if let Ok(record) = self.page_mut(page) {
            record.status = PageStatus::Rendered;
            record.rendered_scale = Some(scale);
            record.last_error = None;
        }
        Completion::Applied
    }

    /// Record a failed draw. The page is not drawn again until the next
    /// document load.
    ///
    /// Returns the page-scoped error when the failure belongs to the active
    /// task, `None` for stale failures.
    pub fn fail_render(&mut self, id: RequestId, page: usize, detail: &str) -> Option<ViewerError> {
        self.take_active(id, page)?;
        warn!("Render of page {page} failed: {detail}");
        if let Ok(record) = self.page_mut(page) {
            record.status = PageStatus::Loaded;
            record.last_error = Some(detail.to_string());
        }
        Some(ViewerError::page_render(page, detail))
    }

    /// Drop a task that the worker reported as cancelled
    pub fn acknowledge_cancel(&mut self, id: RequestId, page: usize) -> Completion {
        if self.take_active(id, page).is_none() {
            return Completion::Stale;
        }
        if let Ok(record) = self.page_mut(page) {
            record.status = if record.rendered_scale.is_some() {
                PageStatus::Rendered
            } else {
                PageStatus::Loaded
            };
        }
        Completion::Applied
    }

    fn take_active(&mut self, id: RequestId, page: usize) -> Option<f32> {
        match self.active.get(&page) {
            Some(task) if task.id == id => self.active.remove(&page).map(|t| t.scale),
            _ => None,
        }
    }

    #[must_use]
    pub fn active_task(&self, page: usize) -> Option<&RenderTask> {
        self.active.get(&page)
    }

    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.active.len()
    }

    /// Record the last visibility ratio reported for a page
    pub fn set_visibility(&mut self, page: usize, ratio: f32) {
        if let Ok(record) = self.page_mut(page) {
            record.visibility_ratio = ratio.clamp(0.0, 1.0);
        }
    }

    /// Pages that are loaded and eagerly rendered around the current page
    #[must_use]
    pub fn priority_window(&self, current: usize) -> RangeInclusive<usize> {
        let last = self.pages.len();
        if last == 0 {
            return 1..=0;
        }
        let current = current.clamp(1, last);
        current.saturating_sub(1).max(1)..=(current + 1).min(last)
    }

    /// First page with known dimensions
    #[must_use]
    pub fn first_loaded_size(&self) -> Option<PageSize> {
        self.pages.iter().find(|p| p.loaded()).and_then(|p| p.size)
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }
}
