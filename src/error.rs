use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::AcquireError;

#[derive(Debug, Error)]
pub enum PrerenderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Server startup failed: {0}")]
    ServerStartup(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Navigation failed for route {route}: {message}")]
    Navigation { route: String, message: String },

    #[error("Page evaluation failed for route {route}: {message}")]
    Evaluation { route: String, message: String },

    #[error("Capture failed for route {route}: {message}")]
    Capture { route: String, message: String },

    #[error("Route {route} timed out after {timeout:?}")]
    Timeout { route: String, timeout: Duration },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Render task failed: {0}")]
    TaskJoin(String),

    #[error("Semaphore acquire error: {0}")]
    Semaphore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AcquireError> for PrerenderError {
    fn from(err: AcquireError) -> Self {
        PrerenderError::Semaphore(err.to_string())
    }
}
