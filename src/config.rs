// ABOUTME: Configuration module for the folio carousel tooling
// ABOUTME: Provides configuration settings and environment variable handling

use crate::carousel::CarouselSettings;
use crate::errors::{FolioError, Result};
use crate::factory::{self, SectionRule};
use crate::viewport::Breakpoints;
use std::env;
use std::path::PathBuf;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Viewport width the factory lays carousels out for when prerendering.
    pub viewport_width: u32,
    pub autoplay_ms: u32,
    pub swipe_threshold_px: f64,
    pub embed_resources: bool,
    /// Replacement for the built-in section table.
    pub rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            autoplay_ms: 4000,
            swipe_threshold_px: 50.0,
            embed_resources: true,
            rules_path: None,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let viewport_width = env::var("FOLIO_VIEWPORT_WIDTH")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.viewport_width);
        let autoplay_ms = env::var("FOLIO_AUTOPLAY_MS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.autoplay_ms);
        let swipe_threshold_px = env::var("FOLIO_SWIPE_THRESHOLD_PX")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(defaults.swipe_threshold_px);
        let embed_resources = env::var("FOLIO_EMBED_RESOURCES")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);
        let rules_path = env::var("FOLIO_RULES_PATH").ok().map(PathBuf::from);

        Self {
            viewport_width,
            autoplay_ms,
            swipe_threshold_px,
            embed_resources,
            rules_path,
        }
    }

    /// Reject values no carousel can be laid out or driven with.
    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 {
            return Err(FolioError::ConfigError(
                "viewport width must be positive".to_string(),
            ));
        }
        if !self.swipe_threshold_px.is_finite() || self.swipe_threshold_px < 0.0 {
            return Err(FolioError::ConfigError(format!(
                "swipe threshold must be a non-negative distance, got {}",
                self.swipe_threshold_px
            )));
        }
        Ok(())
    }

    /// Carousel settings with this configuration's overrides applied.
    pub fn carousel_settings(&self) -> CarouselSettings {
        CarouselSettings {
            autoplay_ms: self.autoplay_ms,
            swipe_threshold_px: self.swipe_threshold_px,
            ..CarouselSettings::default()
        }
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.carousel_settings().breakpoints
    }

    /// The section table: the rules file when one is configured, otherwise
    /// the built-in table.
    pub fn section_rules(&self) -> Result<Vec<SectionRule>> {
        match &self.rules_path {
            Some(path) => factory::load_rules(path),
            None => Ok(factory::default_rules()),
        }
    }
}
