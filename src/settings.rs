use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ViewerError;
use crate::pdf::{DEFAULT_CACHE_SIZE, DEFAULT_WORKERS, ScaleRange, ServiceConfig};
use crate::toolbar::{LabelOverrides, ToolbarLabels, ToolbarVariant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub variant: ToolbarVariant,

    /// Worker script location handed to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_url: Option<String>,

    /// Disable text selection on rendered pages
    #[serde(default)]
    pub disable_select: bool,

    /// Overrides the variant's scale bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_range: Option<ScaleRange>,

    #[serde(default = "default_workers")]
    pub render_workers: usize,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    #[serde(default = "default_rate_limit_ms")]
    pub scroll_throttle_ms: u64,

    #[serde(default = "default_rate_limit_ms")]
    pub resize_debounce_ms: u64,

    #[serde(default)]
    pub labels: LabelOverrides,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_rate_limit_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: ToolbarVariant::default(),
            worker_url: None,
            disable_select: false,
            scale_range: None,
            render_workers: default_workers(),
            cache_size: default_cache_size(),
            scroll_throttle_ms: default_rate_limit_ms(),
            resize_debounce_ms: default_rate_limit_ms(),
            labels: LabelOverrides::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, ViewerError> {
        serde_yaml::from_str(text).map_err(|e| ViewerError::Config {
            detail: e.to_string(),
        })
    }

    /// Load settings from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| ViewerError::Config {
            detail: format!("{}: {e}", path.display()),
        })?;
        let settings = Self::from_yaml(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    #[must_use]
    pub fn scale_range(&self) -> ScaleRange {
        self.scale_range
            .map(|r| ScaleRange::new(r.min, r.max))
            .unwrap_or_else(|| self.variant.scale_range())
    }

    #[must_use]
    pub fn labels(&self) -> ToolbarLabels {
        ToolbarLabels::for_variant(self.variant).with_overrides(&self.labels)
    }

    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            workers: self.render_workers,
            cache_size: self.cache_size,
        }
    }

    #[must_use]
    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    #[must_use]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_gives_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.scale_range(), ScaleRange::DESKTOP);
    }

    #[test]
    fn touch_variant_widens_scale_range() {
        let settings = Settings::from_yaml("variant: touch").unwrap();
        assert_eq!(settings.scale_range(), ScaleRange::TOUCH);
        assert_eq!(settings.labels().pages_of(1, 2), "1 / 2");
    }

    #[test]
    fn explicit_range_and_labels() {
        let yaml = r#"
scale_range:
  min: 0.25
  max: 4.0
labels:
  zoom_in: "Vergrößern"
disable_select: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.scale_range(), ScaleRange::new(0.25, 4.0));
        assert_eq!(settings.labels().zoom_in, "Vergrößern");
        assert!(settings.disable_select);
    }

    #[test]
    fn invalid_yaml_is_config_error() {
        let err = Settings::from_yaml("render_workers: many").unwrap_err();
        assert!(matches!(err, ViewerError::Config { .. }));
    }

    #[test]
    fn load_reads_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert_eq!(Settings::load(&missing).unwrap(), Settings::default());

        let path = dir.path().join("viewer.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "render_workers: 4\nscroll_throttle_ms: 250").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.render_workers, 4);
        assert_eq!(settings.scroll_throttle(), Duration::from_millis(250));
    }
}
