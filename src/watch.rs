// ABOUTME: Watch module for monitoring page changes and re-prerendering outputs
// ABOUTME: Regenerates the page after each quiet period of file events

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;

use crate::config::Config as AppConfig;
use crate::errors::{FolioError, Result};
use crate::page::{self, PageOptions};
use crate::resources::ResourceFile;
use crate::utils;

/// Configuration for watch mode
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Path to the source page to watch
    pub page_path: PathBuf,

    /// Prerendered page path
    pub html_output: PathBuf,

    pub css_files: Vec<ResourceFile>,
    pub js_files: Vec<ResourceFile>,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            page_path: PathBuf::new(),
            html_output: PathBuf::new(),
            css_files: Vec::new(),
            js_files: Vec::new(),
            debounce_ms: 500,
        }
    }
}

/// When to prerender: at most once per `window`, and never losing a change
/// that arrives while the previous run is still inside its window.
#[derive(Debug)]
pub(crate) struct RegenSchedule {
    window: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl RegenSchedule {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            last_run: None,
            pending: false,
        }
    }

    pub(crate) fn changed(&mut self) {
        self.pending = true;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether a prerender should run at `now`. Taking it clears the pending
    /// change and opens a new window.
    pub(crate) fn take_due(&mut self, now: Instant) -> bool {
        if !self.pending || self.remaining(now) > Duration::ZERO {
            return false;
        }
        self.pending = false;
        self.last_run = Some(now);
        true
    }

    /// How long to wait for further events before checking again.
    pub(crate) fn wait(&self, now: Instant) -> Duration {
        if self.pending {
            self.remaining(now)
        } else {
            self.window
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        match self.last_run {
            Some(last) => self.window.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

/// Watch the source page and re-prerender it whenever it or a local resource
/// changes.
pub fn watch_page(config: WatchConfig, app_config: &AppConfig) -> Result<()> {
    utils::validate_file_exists(&config.page_path)?;
    utils::ensure_parent_directory_exists(&config.html_output)?;

    let mut options = PageOptions::from_config(app_config)?;
    options.css_files = config.css_files.clone();
    options.js_files = config.js_files.clone();

    regenerate(&config, &options)?;

    let window = Duration::from_millis(config.debounce_ms);
    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(window, None, tx)
        .map_err(|e| FolioError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    let watch_path = utils::get_absolute_path(&utils::parent_or_current(&config.page_path))?;
    debouncer
        .watcher()
        .watch(&watch_path, RecursiveMode::Recursive)
        .map_err(|e| {
            FolioError::WatchError(format!("Failed to watch {:?}: {}", watch_path, e))
        })?;

    info!("Watching for changes in {:?}", watch_path);
    println!("Watching for changes in {:?} (Press Ctrl+C to stop)", watch_path);

    let mut schedule = RegenSchedule::new(window);
    loop {
        match rx.recv_timeout(schedule.wait(Instant::now())) {
            Ok(Ok(events)) => {
                let relevant = events
                    .iter()
                    .flat_map(|event| event.paths.iter())
                    .any(|path| is_relevant_path(path, &config));
                if relevant {
                    schedule.changed();
                }
            }
            Ok(Err(errors)) => {
                for e in errors {
                    error!("Watch error: {:?}", e);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if schedule.take_due(Instant::now()) {
            if let Err(e) = regenerate(&config, &options) {
                error!("Failed to regenerate page: {}", e);
            }
        } else if schedule.is_pending() {
            debug!("Change queued until the debounce window closes");
        }
    }

    Ok(())
}

/// Whether a changed path should trigger a prerender. The output itself never
/// does, or writing it would retrigger the watcher.
pub(crate) fn is_relevant_path(path: &Path, config: &WatchConfig) -> bool {
    let same = |a: &Path, b: &Path| {
        a == b
            || matches!(
                (utils::get_absolute_path(a), utils::get_absolute_path(b)),
                (Ok(x), Ok(y)) if x == y
            )
    };

    if same(path, &config.html_output) {
        return false;
    }
    if same(path, &config.page_path) {
        return true;
    }

    let local_resource = config
        .css_files
        .iter()
        .chain(config.js_files.iter())
        .filter(|r| !r.is_remote)
        .any(|r| same(path, Path::new(&r.path)));
    if local_resource {
        return true;
    }

    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "html" || ext == "css" || ext == "js"
        }
        None => false,
    }
}

fn regenerate(config: &WatchConfig, options: &PageOptions) -> Result<()> {
    info!("Regenerating page...");
    let (html, report) = page::prerender_file(&config.page_path, options)?;
    page::write_html_to_file(&html, &config.html_output)?;
    info!(
        "Page regenerated: {:?} ({} carousel(s))",
        config.html_output,
        report.plans.len()
    );
    Ok(())
}
