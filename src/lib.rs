pub mod error;
pub mod panic_handler;
pub mod pdf;
pub mod png_export;
pub mod settings;
pub mod throttle;
pub mod toolbar;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{EngineError, ViewerError};
pub use settings::Settings;
pub use viewer::Viewer;
