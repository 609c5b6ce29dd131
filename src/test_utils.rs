pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use crate::error::EngineError;
    use crate::pdf::{
        Bitmap, CancellationToken, DocumentSource, PageSize, PdfDocument, PdfEngine,
    };
    use crate::settings::Settings;
    use crate::viewer::Viewer;

    /// US letter in PDF points
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);

    /// Calls observed by a [`MockEngine`]
    #[derive(Debug, Default)]
    pub struct MockStats {
        pub opens: AtomicUsize,
        pub page_loads: AtomicUsize,
        pub renders: AtomicUsize,
        pub worker_url: Mutex<Option<String>>,
        pub last_source: Mutex<Option<DocumentSource>>,
    }

    impl MockStats {
        pub fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }

        pub fn page_loads(&self) -> usize {
            self.page_loads.load(Ordering::SeqCst)
        }

        pub fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    /// Engine that draws solid bitmaps sized from configured page dimensions
    #[derive(Debug, Clone, Default)]
    pub struct MockEngine {
        pages: Vec<PageSize>,
        open_error: Option<String>,
        failing_loads: HashSet<usize>,
        failing_renders: HashSet<usize>,
        render_delay: Option<Duration>,
        stats: Arc<MockStats>,
    }

    impl MockEngine {
        /// Document with `count` letter-sized pages
        pub fn with_pages(count: usize) -> Self {
            Self::with_sizes(vec![LETTER; count])
        }

        pub fn with_sizes(pages: Vec<PageSize>) -> Self {
            Self {
                pages,
                ..Self::default()
            }
        }

        /// Every open fails with `message`
        pub fn failing_open(message: &str) -> Self {
            Self {
                open_error: Some(message.to_string()),
                ..Self::default()
            }
        }

        /// Page metadata for `page` (1-based) cannot be read
        pub fn fail_load_of(mut self, page: usize) -> Self {
            self.failing_loads.insert(page);
            self
        }

        /// Drawing `page` (1-based) always fails
        pub fn fail_render_of(mut self, page: usize) -> Self {
            self.failing_renders.insert(page);
            self
        }

        pub fn with_render_delay(mut self, delay: Duration) -> Self {
            self.render_delay = Some(delay);
            self
        }

        pub fn stats(&self) -> Arc<MockStats> {
            Arc::clone(&self.stats)
        }
    }

    impl PdfEngine for MockEngine {
        type Document = MockDocument;

        fn open(&self, source: &DocumentSource) -> Result<MockDocument, EngineError> {
            self.stats.opens.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.stats.last_source.lock() {
                *last = Some(source.clone());
            }
            if let Some(message) = &self.open_error {
                return Err(EngineError::generic(message.clone()));
            }
            Ok(MockDocument {
                engine: self.clone(),
            })
        }

        fn configure_worker(&self, worker_url: &str) {
            if let Ok(mut url) = self.stats.worker_url.lock() {
                *url = Some(worker_url.to_string());
            }
        }
    }

    pub struct MockDocument {
        engine: MockEngine,
    }

    impl PdfDocument for MockDocument {
        fn page_count(&self) -> usize {
            self.engine.pages.len()
        }

        fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
            self.engine.stats.page_loads.fetch_add(1, Ordering::SeqCst);
            if self.engine.failing_loads.contains(&(index + 1)) {
                return Err(EngineError::generic("corrupt page object"));
            }
            self.engine
                .pages
                .get(index)
                .copied()
                .ok_or_else(|| EngineError::generic("no such page"))
        }

        fn render(
            &self,
            index: usize,
            scale: f32,
            cancel: &CancellationToken,
        ) -> Result<Bitmap, EngineError> {
            cancel.check()?;
            if let Some(delay) = self.engine.render_delay {
                thread::sleep(delay);
                cancel.check()?;
            }
            self.engine.stats.renders.fetch_add(1, Ordering::SeqCst);
            if self.engine.failing_renders.contains(&(index + 1)) {
                return Err(EngineError::generic("broken content stream"));
            }
            let size = self
                .engine
                .pages
                .get(index)
                .copied()
                .ok_or_else(|| EngineError::generic("no such page"))?
                .scaled(scale);
            Ok(Bitmap::filled(
                size.width.round() as u32,
                size.height.round() as u32,
                (255, 255, 255),
            ))
        }
    }

    /// Base64 data URI around arbitrary bytes
    pub fn pdf_data_uri(bytes: &[u8]) -> String {
        format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
    }

    /// Viewer over a mock engine with a 800x600 viewport
    pub fn viewer_with(engine: MockEngine, settings: Settings) -> Viewer<MockEngine> {
        let mut viewer = Viewer::new(engine, settings);
        viewer.set_viewport(800.0, 600.0, std::time::Instant::now());
        viewer
    }

    /// Load `url` and wait for all engine work to finish
    pub fn load_and_settle(viewer: &mut Viewer<MockEngine>, url: &str) {
        viewer.load(url).expect("load should start");
        settle(viewer);
    }

    pub fn settle(viewer: &mut Viewer<MockEngine>) {
        let idle = viewer
            .wait_idle(Duration::from_secs(5))
            .expect("engine work should not fail");
        assert!(idle, "viewer did not go idle");
    }
}
