//! PDF rendering infrastructure

mod cache;
mod engine;
mod layout;
#[cfg(feature = "pdf")]
mod mupdf_engine;
mod page;
mod pinch;
mod request;
mod service;
mod source;
mod state;
mod types;
mod visibility;
mod worker;
mod zoom;

pub use cache::{BitmapCache, CacheKey, CacheStats};
pub use engine::{CancellationToken, PdfDocument, PdfEngine};
pub use layout::{NAVIGATION_MARGIN, PLACEHOLDER_HEIGHT, PageLayout};
#[cfg(feature = "pdf")]
pub use mupdf_engine::MupdfEngine;
pub use page::{Completion, Page, PageStatus, RenderController, RenderTask};
pub use pinch::{PinchOutcome, PinchTracker, ScrollPosition, TouchPoint};
pub use request::{RenderRequest, RenderResponse, RequestId};
pub use service::{RenderService, ServiceConfig};
pub use source::{DocumentSource, decode_data_uri, is_data_uri, resolve_source};
pub use state::{Command, Effect, INITIAL_SCALE, ViewState};
pub use types::*;
pub use visibility::{SCROLL_SPY_BUFFER, VisibilityTracker, page_at_scroll};
pub use zoom::*;

/// Render worker threads per document
pub const DEFAULT_WORKERS: usize = 2;

/// Rendered bitmaps kept per document
pub const DEFAULT_CACHE_SIZE: usize = 32;
