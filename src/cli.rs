use crate::config::{PrerenderConfig, RenderWait};
use crate::error::PrerenderError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::info;

#[derive(Parser)]
#[command(name = "prerender-tool")]
#[command(about = "Prerender a single-page application to static HTML")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Directory containing the built application")]
    pub static_dir: Option<PathBuf>,

    #[arg(short = 'r', long = "route", help = "Route to prerender (repeatable)")]
    pub routes: Vec<String>,

    #[arg(long, help = "File containing routes, one per line")]
    pub routes_file: Option<PathBuf>,

    #[arg(
        long,
        help = "HTML file served for non-file requests instead of <static-dir>/index.html"
    )]
    pub index_html: Option<PathBuf>,

    #[arg(long, help = "Capture after this event fires on the document")]
    pub render_after_event: Option<String>,

    #[arg(long, help = "Capture after a fixed delay in milliseconds")]
    pub render_after_time: Option<u64>,

    #[arg(long, help = "Abort requests that leave the local server origin")]
    pub skip_third_party_requests: bool,

    #[arg(
        long,
        help = "Maximum routes rendered concurrently (0 = unbounded)"
    )]
    pub max_concurrent_routes: Option<usize>,

    #[arg(long, help = "Per-route render timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Chrome executable path")]
    pub chrome_path: Option<String>,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

/// Builds the run configuration: config file first, CLI flags on top.
pub async fn load_config(args: &Cli) -> Result<PrerenderConfig, PrerenderError> {
    let mut config = if let Some(config_path) = &args.config {
        let config_content = fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        PrerenderConfig::default()
    };

    if let Some(static_dir) = &args.static_dir {
        config.static_dir = static_dir.clone();
    }

    if !args.routes.is_empty() {
        config.routes = args.routes.clone();
    }
    if let Some(routes_file) = &args.routes_file {
        config
            .routes
            .extend(read_routes_from_file(routes_file).await?);
    }

    if let Some(index_path) = &args.index_html {
        config.index_html = Some(fs::read_to_string(index_path).await?);
    }

    if args.render_after_event.is_some() || args.render_after_time.is_some() {
        config.wait = RenderWait::resolve(
            args.render_after_event.clone(),
            args.render_after_time.map(Duration::from_millis),
        );
    }

    if args.skip_third_party_requests {
        config.skip_third_party_requests = true;
    }

    if let Some(max_concurrent) = args.max_concurrent_routes {
        config.max_concurrent_routes = max_concurrent;
    }

    if let Some(timeout) = args.timeout {
        config.render_timeout = Duration::from_secs(timeout);
    }

    if let Some(chrome_path) = &args.chrome_path {
        config.chrome_path = Some(chrome_path.clone());
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Routes: {}", config.routes.len());
    info!("Static directory: {}", config.static_dir.display());
    info!("Max concurrent routes: {}", config.max_concurrent_routes);
    info!("Render wait: {:?}", config.wait);

    Ok(config)
}

/// Reads routes from a file, one per line; blank lines and `#` comments are
/// skipped.
pub async fn read_routes_from_file(path: &PathBuf) -> Result<Vec<String>, PrerenderError> {
    let content = fs::read_to_string(path).await?;
    let routes: Vec<String> = content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect();

    Ok(routes)
}

pub fn setup_logging(verbose: bool) -> Result<(), PrerenderError> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| PrerenderError::Config(format!("Failed to initialize logging: {e}")))
}
