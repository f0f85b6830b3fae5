//! # Prerender Tool
//!
//! Renders a single-page application's routes to static HTML ahead of time.
//! The tool serves the application's build directory from an ephemeral local
//! port, drives a pool of headless Chrome pages across the configured
//! routes, waits for each page to reach a renderable state, and writes the
//! captured DOM to `<static_dir>/<route>/index.html` so the site can be
//! served without client-side rendering.
//!
//! ## Features
//!
//! - **Ephemeral static server**: OS-assigned port, SPA index fallback
//! - **Bounded concurrency**: at most `max_concurrent_routes` pages at once
//!   (0 = unbounded), results returned in input route order
//! - **Render wait strategies**: capture immediately after load, after a
//!   named document event, or after a fixed delay
//! - **Third-party request filtering**: optionally abort any request that
//!   leaves the local server origin
//! - **Guaranteed teardown**: server and browser are closed on every exit
//!   path, including failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prerender_tool::{prerender, PrerenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PrerenderConfig {
//!         routes: vec!["/".to_string(), "/about".to_string()],
//!         static_dir: "./dist".into(),
//!         ..Default::default()
//!     };
//!
//!     let results = prerender(config).await?;
//!     println!("Rendered {} routes", results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! prerender-tool --static-dir ./dist --route / --route /about \
//!     --render-after-event app-rendered --max-concurrent-routes 4
//! ```

/// Run configuration and result types
pub mod config;

/// Error types
pub mod error;

/// Concurrency limiting for route render jobs
pub mod limit;

/// Output path mapping and HTML file emission
pub mod output;

/// Run orchestration
pub mod prerenderer;

/// Browser lifecycle and per-route page rendering
pub mod renderer;

/// Ephemeral static file server
pub mod server;

/// Command-line interface implementation
pub mod cli;

#[cfg(test)]
mod tests;

pub use cli::*;
pub use config::*;
pub use error::*;
pub use limit::*;
pub use output::*;
pub use prerenderer::*;
pub use renderer::*;
pub use server::*;
