//! Viewer orchestrator
//!
//! Owns the view state, the page records and the render service of the
//! loaded document, and turns host events (navigation, zoom, resize,
//! scroll, visibility, touch) into state changes and engine requests.
//! All methods run on the host's UI thread; engine work happens on the
//! render service's workers and is applied by [`Viewer::pump`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::error::ViewerError;
use crate::pdf::{
    Command, Completion, DocumentInfo, Effect, Page, PageLayout, PdfEngine, PinchTracker,
    RenderController, RenderResponse, RenderService, RenderedPage, SCROLL_SPY_BUFFER,
    ScrollPosition, TouchPoint, ViewMode, ViewState, ViewportSize, VisibilityTracker, fit_scale,
    is_data_uri, page_at_scroll, resolve_source, step_in, step_out,
};
use crate::settings::Settings;
use crate::throttle::{Debounce, Throttle};
use crate::toolbar::{ToolbarAction, ToolbarLabels, ToolbarSnapshot, parse_page_input};

type LoadSuccessFn = Box<dyn FnMut(&DocumentInfo)>;
type ErrorFn = Box<dyn FnMut(&ViewerError)>;
type PageChangedFn = Box<dyn FnMut(usize, usize)>;

#[derive(Default)]
struct Callbacks {
    on_load_success: Option<LoadSuccessFn>,
    on_load_error: Option<ErrorFn>,
    on_page_changed: Option<PageChangedFn>,
    on_page_error: Option<ErrorFn>,
}

/// Embeddable PDF viewer driven by a rendering engine
pub struct Viewer<E: PdfEngine> {
    engine: Arc<E>,
    settings: Settings,
    labels: ToolbarLabels,
    state: ViewState,
    pages: RenderController,
    visibility: VisibilityTracker,
    pinch: PinchTracker,
    service: Option<RenderService>,
    document: Option<DocumentInfo>,
    bitmaps: HashMap<usize, Arc<RenderedPage>>,
    scroll: ScrollPosition,
    scroll_throttle: Throttle,
    resize_debounce: Debounce,
    callbacks: Callbacks,
}

impl<E: PdfEngine> Viewer<E> {
    #[must_use]
    pub fn new(engine: E, settings: Settings) -> Self {
        if let Some(url) = &settings.worker_url {
            engine.configure_worker(url);
        }

        Self {
            engine: Arc::new(engine),
            labels: settings.labels(),
            state: ViewState::new(settings.scale_range()),
            pages: RenderController::new(),
            visibility: VisibilityTracker::default(),
            pinch: PinchTracker::new(),
            service: None,
            document: None,
            bitmaps: HashMap::new(),
            scroll: ScrollPosition::default(),
            scroll_throttle: Throttle::new(settings.scroll_throttle()),
            resize_debounce: Debounce::new(settings.resize_debounce()),
            callbacks: Callbacks::default(),
            settings,
        }
    }

    /// Called once a document opened
    #[must_use]
    pub fn on_load_success(mut self, f: impl FnMut(&DocumentInfo) + 'static) -> Self {
        self.callbacks.on_load_success = Some(Box::new(f));
        self
    }

    /// Called when a document fails to resolve or open. Without this
    /// handler such errors are returned to the caller instead.
    #[must_use]
    pub fn on_load_error(mut self, f: impl FnMut(&ViewerError) + 'static) -> Self {
        self.callbacks.on_load_error = Some(Box::new(f));
        self
    }

    /// Called with `(current_page, total_pages)` whenever the current page changes
    #[must_use]
    pub fn on_page_changed(mut self, f: impl FnMut(usize, usize) + 'static) -> Self {
        self.callbacks.on_page_changed = Some(Box::new(f));
        self
    }

    /// Called when a single page fails to load or draw
    #[must_use]
    pub fn on_page_error(mut self, f: impl FnMut(&ViewerError) + 'static) -> Self {
        self.callbacks.on_page_error = Some(Box::new(f));
        self
    }

    /// Load a document from a URL or data URI.
    ///
    /// The source is resolved before anything is reset, so a malformed data
    /// URI leaves the current view untouched. Opening happens on the render
    /// workers; the result is applied by [`Viewer::pump`].
    pub fn load(&mut self, url: &str) -> Result<(), ViewerError> {
        let source = if url.is_empty() {
            None
        } else {
            match resolve_source(url) {
                Ok(source) => Some(source),
                Err(e) => return self.report_load_error(e),
            }
        };

        self.service = None;
        self.document = None;
        self.scroll = ScrollPosition::default();
        self.pinch.cancel();
        self.resize_debounce.cancel();
        self.scroll_throttle.reset();
        self.run(Command::BeginLoad);

        let Some(source) = source else {
            debug!("Empty document URL, nothing to load");
            return Ok(());
        };

        info!("Loading document {}", describe_url(url));
        match RenderService::spawn(
            Arc::clone(&self.engine),
            source,
            self.settings.service_config(),
        ) {
            Ok(service) => {
                self.service = Some(service);
                Ok(())
            }
            Err(e) => {
                self.run(Command::LoadFailed);
                self.report_load_error(e)
            }
        }
    }

    /// Apply every response the render workers produced so far.
    ///
    /// Returns the number of responses handled. Fails only for document
    /// errors when no load-error handler is registered.
    pub fn pump(&mut self) -> Result<usize, ViewerError> {
        let mut handled = 0;
        while let Some(response) = self.service.as_mut().and_then(RenderService::try_recv) {
            self.handle_response(response)?;
            handled += 1;
        }
        self.tick(Instant::now());
        Ok(handled)
    }

    /// Block until no engine request is outstanding or `timeout` elapses.
    ///
    /// Returns `true` when the viewer went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<bool, ViewerError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump()?;
            if self.is_idle() {
                return Ok(true);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            let response = self
                .service
                .as_mut()
                .and_then(|service| service.recv_timeout(remaining));
            if let Some(response) = response {
                self.handle_response(response)?;
            }
        }
    }

    /// True when no engine request is outstanding
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.service
            .as_ref()
            .is_none_or(|service| service.in_flight() == 0)
    }

    /// Process time-based work such as the debounced resize refit
    pub fn tick(&mut self, now: Instant) {
        if self.resize_debounce.poll(now) {
            self.zoom_to_page_view();
        }
    }

    fn handle_response(&mut self, response: RenderResponse) -> Result<(), ViewerError> {
        match response {
            RenderResponse::Opened { page_count } => {
                info!("Document opened with {page_count} pages");
                let info = DocumentInfo { page_count };
                self.pages.reset(page_count);
                self.visibility.reset(page_count);
                self.document = Some(info.clone());
                if let Some(cb) = self.callbacks.on_load_success.as_mut() {
                    cb(&info);
                }
                self.run(Command::DocumentReady(page_count));
            }

            RenderResponse::OpenFailed { error } => {
                error!("Failed to open document: {error}");
                self.service = None;
                self.document = None;
                self.run(Command::LoadFailed);
                self.report_load_error(ViewerError::DocumentLoad(error))?;
            }

            RenderResponse::PageLoaded { page, size } => {
                if let Err(e) = self.pages.finish_load(page, size) {
                    debug!("Dropping load result: {e}");
                    return Ok(());
                }
                debug!("Page {page} loaded: {}x{}", size.width, size.height);
                if page == 1 {
                    self.zoom_to_page_view();
                }
                if self.wants_render(page) {
                    self.ensure_rendered(page);
                }
            }

            RenderResponse::PageLoadFailed { page, error } => {
                let err = self.pages.fail_load(page, &error.to_string());
                self.report_page_error(err);
            }

            RenderResponse::Rendered { id, page, data } => {
                if self.pages.finish_render(id, page) == Completion::Applied {
                    self.bitmaps.insert(page, data);
                } else {
                    debug!("Discarding stale render {id:?} of page {page}");
                }
            }

            RenderResponse::Cancelled { id, page } => {
                let _ = self.pages.acknowledge_cancel(id, page);
            }

            RenderResponse::RenderFailed { id, page, error } => {
                if let Some(err) = self.pages.fail_render(id, page, &error.to_string()) {
                    self.report_page_error(err);
                }
            }
        }
        Ok(())
    }

    /// Go to a page (clamped) and scroll it into view.
    ///
    /// Returns the new vertical scroll offset.
    pub fn navigate_to(&mut self, page: usize) -> f32 {
        self.run(Command::GoToPage(page));
        self.scroll.top
    }

    pub fn next_page(&mut self) -> f32 {
        self.navigate_to(self.state.current_page + 1)
    }

    pub fn prev_page(&mut self) -> f32 {
        self.navigate_to(self.state.current_page.saturating_sub(1))
    }

    /// Set a user-chosen scale; switches back to the default view mode
    pub fn set_scale(&mut self, scale: f32) {
        self.run(Command::SetScale(scale));
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(step_in(self.state.scale));
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(step_out(self.state.scale));
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.run(Command::SetViewMode(mode));
    }

    pub fn toggle_fullscreen(&mut self) {
        self.run(Command::ToggleFullscreen);
    }

    /// Report the container size. The scale is refit once resizing settles.
    pub fn set_viewport(&mut self, width: f32, height: f32, now: Instant) {
        self.run_at(Command::SetViewport(ViewportSize::new(width, height)), now);
    }

    /// Scale from the current view mode, the first loaded page and the viewport
    fn zoom_to_page_view(&mut self) {
        if self.state.loading {
            return;
        }
        let Some(reference) = self.pages.first_loaded_size() else {
            return;
        };
        let Some(scale) = fit_scale(self.state.view_mode, reference, self.state.viewport) else {
            return;
        };
        debug!(
            "{} fit to {}x{}: scale {scale}",
            self.state.view_mode.as_str(),
            self.state.viewport.width,
            self.state.viewport.height
        );
        self.run(Command::ApplyFitScale(scale));
    }

    /// Apply a toolbar interaction
    pub fn dispatch(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::PrevPage => {
                self.prev_page();
            }
            ToolbarAction::NextPage => {
                self.next_page();
            }
            ToolbarAction::PageInput(text) => {
                if let Some(page) = parse_page_input(&text) {
                    self.navigate_to(page);
                }
            }
            ToolbarAction::ZoomIn => self.zoom_in(),
            ToolbarAction::ZoomOut => self.zoom_out(),
            ToolbarAction::SetViewMode(mode) => self.set_view_mode(mode),
            ToolbarAction::ToggleFullscreen => self.toggle_fullscreen(),
        }
    }

    /// Host scroll event. The scroll spy runs at most once per throttle
    /// interval.
    pub fn on_scroll(&mut self, top: f32, now: Instant) {
        self.scroll.top = top.max(0.0);
        if !self.scroll_throttle.ready(now) || self.state.page_count == 0 {
            return;
        }
        let layout = self.layout();
        let page = page_at_scroll(layout.offsets(), self.scroll.top, SCROLL_SPY_BUFFER);
        self.run(Command::SyncCurrentPage(page));
    }

    /// Visibility observer callback for one page
    pub fn on_visibility(&mut self, page: usize, ratio: f32) {
        if self.visibility.is_suspended() {
            return;
        }
        self.pages.set_visibility(page, ratio);
        if ratio > 0.0 {
            self.request_page(page);
        }
        if let Some(current) = self.visibility.update(page, ratio) {
            self.run(Command::SyncCurrentPage(current));
        }
    }

    /// Derive visibility from the crate's own layout, for hosts without an
    /// intersection observer
    pub fn refresh_visibility(&mut self) {
        let ratios = self
            .layout()
            .visibility_ratios(self.scroll.top, self.state.viewport.height);
        for (idx, ratio) in ratios.into_iter().enumerate() {
            self.on_visibility(idx + 1, ratio);
        }
    }

    /// Two fingers touched down
    pub fn pinch_start(&mut self, a: TouchPoint, b: TouchPoint) -> bool {
        let started = self.pinch.start(a, b, self.state.scale, self.scroll);
        if started {
            self.visibility.set_suspended(true);
        }
        started
    }

    /// Fingers moved; returns the live relative scale for visual feedback
    pub fn pinch_move(&mut self, a: TouchPoint, b: TouchPoint) -> Option<f32> {
        self.pinch.update(a, b)
    }

    /// Fingers lifted; commits the scale and restores the scroll position.
    ///
    /// Returns the committed scale.
    pub fn pinch_end(&mut self) -> Option<f32> {
        let outcome = self.pinch.finish(self.state.scale_range);
        self.visibility.set_suspended(false);
        let outcome = outcome?;
        self.set_scale(outcome.scale);
        self.scroll = outcome.scroll;
        Some(self.state.scale)
    }

    pub fn pinch_cancel(&mut self) {
        self.pinch.cancel();
        self.visibility.set_suspended(false);
    }

    fn run(&mut self, cmd: Command) {
        self.run_at(cmd, Instant::now());
    }

    fn run_at(&mut self, cmd: Command, now: Instant) {
        let effects = self.state.apply(cmd);
        for effect in effects {
            self.execute(effect, now);
        }
    }

    fn execute(&mut self, effect: Effect, now: Instant) {
        match effect {
            Effect::InvalidatePages => {
                self.pages.reset(0);
                self.visibility.reset(0);
                self.bitmaps.clear();
            }

            Effect::RerenderPages => {
                for page in 1..=self.pages.page_count() {
                    if self.wants_render(page) {
                        self.ensure_rendered(page);
                    }
                }
            }

            Effect::RecomputeFit => self.zoom_to_page_view(),

            Effect::ScheduleFit => self.resize_debounce.touch(now),

            Effect::ScrollToPage(page) => {
                if let Some(top) = self.layout().scroll_target(page) {
                    self.scroll.top = top;
                }
            }

            Effect::NotifyPageChanged => {
                let (current, total) = (self.state.current_page, self.state.page_count);
                self.visibility.set_current_page(current);
                if let Some(cb) = self.callbacks.on_page_changed.as_mut() {
                    cb(current, total);
                }
            }

            Effect::PrefetchAroundCurrent => {
                for page in self.pages.priority_window(self.state.current_page) {
                    self.request_page(page);
                }
            }
        }
    }

    /// Load a page, or draw it if it is already loaded
    fn request_page(&mut self, page: usize) {
        match self.pages.begin_load(page) {
            Ok(true) => {
                if let Some(service) = self.service.as_mut() {
                    service.load_page(page);
                }
            }
            Ok(false) => self.ensure_rendered(page),
            Err(e) => debug!("Not loading page: {e}"),
        }
    }

    fn wants_render(&self, page: usize) -> bool {
        self.pages
            .priority_window(self.state.current_page)
            .contains(&page)
            || self
                .pages
                .page(page)
                .is_some_and(|p| p.visibility_ratio > 0.0)
    }

    /// Draw a loaded page at the current scale unless that is already
    /// done or underway
    fn ensure_rendered(&mut self, page: usize) {
        let scale = self.state.scale;
        let Some(record) = self.pages.page(page) else {
            return;
        };
        if !record.loaded() || record.failed() {
            return;
        }
        match self.pages.active_task(page) {
            Some(task) if task.scale == scale => return,
            None if record.rendered() && record.rendered_scale == Some(scale) => return,
            _ => {}
        }

        match self.pages.begin_render(page, scale) {
            Ok(task) => {
                if let Some(service) = self.service.as_mut() {
                    service.render(&task);
                }
            }
            Err(e) => debug!("Not rendering page: {e}"),
        }
    }

    fn report_load_error(&mut self, err: ViewerError) -> Result<(), ViewerError> {
        match self.callbacks.on_load_error.as_mut() {
            Some(cb) => {
                cb(&err);
                Ok(())
            }
            None => Err(err),
        }
    }

    fn report_page_error(&mut self, err: ViewerError) {
        match self.callbacks.on_page_error.as_mut() {
            Some(cb) => cb(&err),
            None => warn!("{err}"),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        self.pages.pages()
    }

    #[must_use]
    pub fn page(&self, page: usize) -> Option<&Page> {
        self.pages.page(page)
    }

    #[must_use]
    pub fn render_controller(&self) -> &RenderController {
        &self.pages
    }

    /// Last bitmap drawn for a page
    #[must_use]
    pub fn page_bitmap(&self, page: usize) -> Option<Arc<RenderedPage>> {
        self.bitmaps.get(&page).cloned()
    }

    #[must_use]
    pub fn scroll_position(&self) -> ScrollPosition {
        self.scroll
    }

    #[must_use]
    pub fn layout(&self) -> PageLayout {
        PageLayout::compute(self.pages.pages(), self.state.scale)
    }

    #[must_use]
    pub fn toolbar(&self) -> ToolbarSnapshot {
        ToolbarSnapshot::from_state(&self.state, &self.labels, self.settings.variant)
    }

    #[must_use]
    pub fn labels(&self) -> &ToolbarLabels {
        &self.labels
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether rendered pages allow text selection
    #[must_use]
    pub fn selection_enabled(&self) -> bool {
        !self.settings.disable_select
    }

    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_active()
    }
}

/// Short form of a document URL for logs; data URIs are not logged in full
fn describe_url(url: &str) -> String {
    if is_data_uri(url) {
        let header = url.split(',').next().unwrap_or(url);
        format!("{header},... ({} bytes)", url.len())
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{Bitmap, PageSize, PageStatus};
    use crate::test_utils::test_helpers::{LETTER, MockEngine};

    fn opened(pages: usize) -> Viewer<MockEngine> {
        let mut viewer = Viewer::new(MockEngine::with_pages(pages), Settings::default());
        viewer.set_viewport(800.0, 600.0, Instant::now());
        viewer
            .handle_response(RenderResponse::Opened { page_count: pages })
            .unwrap();
        viewer
    }

    fn rendered(page: usize, scale: f32) -> Arc<RenderedPage> {
        Arc::new(RenderedPage {
            page,
            scale,
            bitmap: Bitmap::filled(2, 2, (0, 0, 0)),
        })
    }

    #[test]
    fn ready_document_has_unloaded_records() {
        let viewer = opened(5);
        assert_eq!(viewer.pages().len(), 5);
        assert!(viewer.pages().iter().all(|p| !p.loaded()));
        assert_eq!(viewer.page(1).unwrap().status, PageStatus::Loading);
        assert_eq!(viewer.page(3).unwrap().status, PageStatus::Unloaded);
        assert!(!viewer.state().loading);
    }

    #[test]
    fn superseded_render_is_dropped() {
        let mut viewer = opened(3);
        viewer
            .handle_response(RenderResponse::PageLoaded { page: 1, size: LETTER })
            .unwrap();
        let first = viewer.render_controller().active_task(1).unwrap().clone();

        viewer.set_scale(2.0);
        let second = viewer.render_controller().active_task(1).unwrap().clone();
        assert_ne!(first.id, second.id);
        assert!(first.token.is_cancelled());

        viewer
            .handle_response(RenderResponse::Rendered {
                id: first.id,
                page: 1,
                data: rendered(1, first.scale),
            })
            .unwrap();
        assert!(viewer.page_bitmap(1).is_none());

        viewer
            .handle_response(RenderResponse::Rendered {
                id: second.id,
                page: 1,
                data: rendered(1, 2.0),
            })
            .unwrap();
        assert_eq!(viewer.page_bitmap(1).unwrap().scale, 2.0);
        assert_eq!(viewer.page(1).unwrap().rendered_scale, Some(2.0));
    }

    #[test]
    fn visible_page_outside_window_renders_once_loaded() {
        let mut viewer = opened(6);
        viewer.on_visibility(5, 0.4);
        assert_eq!(viewer.page(5).unwrap().status, PageStatus::Loading);

        viewer
            .handle_response(RenderResponse::PageLoaded {
                page: 5,
                size: PageSize::new(500.0, 700.0),
            })
            .unwrap();
        assert!(viewer.render_controller().active_task(5).is_some());
    }

    #[test]
    fn reset_on_load_cancels_pending_draws() {
        let mut viewer = opened(2);
        viewer
            .handle_response(RenderResponse::PageLoaded { page: 1, size: LETTER })
            .unwrap();
        let task = viewer.render_controller().active_task(1).unwrap().clone();

        viewer.load("").unwrap();
        assert!(task.token.is_cancelled());
        assert!(viewer.pages().is_empty());
        assert!(viewer.state().loading);
        assert!(viewer.is_idle());
    }

    #[test]
    fn data_uris_are_abbreviated_in_logs() {
        let described = describe_url("data:application/pdf;base64,AAAA");
        assert_eq!(described, "data:application/pdf;base64,... (32 bytes)");
        assert_eq!(describe_url("a.pdf"), "a.pdf");
    }
}
