//! Run configuration with serde serialization/deserialization
//!
//! This module provides the configuration structures for a prerender run,
//! including the route list, render wait strategy, and browser launch
//! settings.

use crate::error::PrerenderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a single prerender run
///
/// Controls which routes are rendered, where the application's static files
/// live, how long to wait before capturing each page, and how many routes may
/// render concurrently.
///
/// # Examples
///
/// ```rust
/// use prerender_tool::PrerenderConfig;
///
/// let config = PrerenderConfig {
///     routes: vec!["/".to_string(), "/about".to_string()],
///     static_dir: "./dist".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrerenderConfig {
    /// URL paths within the application to render to static HTML
    pub routes: Vec<String>,

    /// Directory containing the built application; also the output root
    pub static_dir: PathBuf,

    /// Literal HTML served for any non-file request instead of
    /// `<static_dir>/index.html`
    #[serde(default)]
    pub index_html: Option<String>,

    /// When a page is considered renderable and safe to capture
    #[serde(default)]
    pub wait: RenderWait,

    /// Abort any request whose origin differs from the local server origin
    /// (default: false)
    #[serde(default)]
    pub skip_third_party_requests: bool,

    /// Maximum number of routes rendered concurrently; 0 means unbounded
    /// (default: 0)
    #[serde(default)]
    pub max_concurrent_routes: usize,

    /// Timeout for a single route's render (default: 30 seconds)
    ///
    /// A navigation or wait condition that hangs past this limit fails the
    /// route instead of stalling the run.
    #[serde(default = "default_render_timeout")]
    pub render_timeout: Duration,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    #[serde(default)]
    pub chrome_path: Option<String>,
}

fn default_render_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for PrerenderConfig {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            static_dir: PathBuf::from("."),
            index_html: None,
            wait: RenderWait::default(),
            skip_third_party_requests: false,
            max_concurrent_routes: 0,
            render_timeout: default_render_timeout(),
            chrome_path: None,
        }
    }
}

impl PrerenderConfig {
    /// Checks the configuration for problems that would fail the run anyway.
    pub fn validate(&self) -> Result<(), PrerenderError> {
        if self.routes.is_empty() {
            return Err(PrerenderError::Config(
                "At least one route is required".to_string(),
            ));
        }

        for route in &self.routes {
            if !route.starts_with('/') {
                return Err(PrerenderError::InvalidRoute(format!(
                    "Route must start with '/': {route}"
                )));
            }
            if route.split('/').any(|segment| segment == "..") {
                return Err(PrerenderError::InvalidRoute(format!(
                    "Route must not contain '..' segments: {route}"
                )));
            }
        }

        if !self.static_dir.is_dir() {
            return Err(PrerenderError::Config(format!(
                "Static directory does not exist: {}",
                self.static_dir.display()
            )));
        }

        if self.render_timeout.is_zero() {
            return Err(PrerenderError::Config(
                "Render timeout must be greater than 0".to_string(),
            ));
        }

        if let RenderWait::AfterEvent(event) = &self.wait {
            // The event name is spliced into page-side scripts.
            if event.is_empty()
                || event
                    .chars()
                    .any(|c| matches!(c, '\'' | '"' | '\\' | '\n'))
            {
                return Err(PrerenderError::Config(format!(
                    "Invalid document event name: {event:?}"
                )));
            }
        }

        Ok(())
    }
}

/// When a page is considered renderable and safe to capture
///
/// The variants are mutually exclusive; an event wins over a delay when both
/// are requested, and the default is to capture as soon as navigation
/// completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderWait {
    /// Capture immediately after the page finishes loading
    #[default]
    Immediate,
    /// Capture after the named event fires on the document
    AfterEvent(String),
    /// Capture after a fixed delay following navigation
    AfterDelay(Duration),
}

impl RenderWait {
    /// Folds the loose option pair into a strategy, event taking priority.
    pub fn resolve(event: Option<String>, delay: Option<Duration>) -> Self {
        match (event, delay) {
            (Some(event), _) => RenderWait::AfterEvent(event),
            (None, Some(delay)) => RenderWait::AfterDelay(delay),
            (None, None) => RenderWait::Immediate,
        }
    }
}

/// Outcome of rendering a single route
#[derive(Debug, Clone)]
pub struct RouteRender {
    /// The route that was rendered
    pub route: String,
    /// Serialized DOM captured from the rendered page
    pub html: String,
    /// Where the HTML was written
    pub output_path: PathBuf,
    /// Time taken to render and persist the route
    pub duration: Duration,
}

/// Generate Chrome command-line arguments for headless prerendering
pub fn get_chrome_args() -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
    ]
}

pub fn create_browser_config(
    config: &PrerenderConfig,
) -> Result<chromiumoxide::browser::BrowserConfig, PrerenderError> {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder().args(get_chrome_args());

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder.build().map_err(PrerenderError::BrowserLaunch)
}
