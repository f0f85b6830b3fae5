//! Ephemeral static file server hosting the application under render
//!
//! The server binds an OS-assigned local port, serves the configured
//! directory, and answers any non-file request with the index document so
//! client-side routes resolve. It lives for exactly one run.

use crate::error::PrerenderError;
use axum::handler::HandlerWithoutStateExt;
use axum::response::Html;
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error};

/// Handle to the running server; the socket is released on [`shutdown`]
/// (or on drop, as a backstop).
///
/// [`shutdown`]: StaticServer::shutdown
pub struct StaticServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StaticServer {
    /// Binds `127.0.0.1:0` and starts serving `static_dir`.
    ///
    /// Non-file requests fall back to `index_html` when supplied, otherwise
    /// to `<static_dir>/index.html`.
    pub async fn start(
        static_dir: &Path,
        index_html: Option<&str>,
    ) -> Result<Self, PrerenderError> {
        let app = build_router(static_dir, index_html);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| PrerenderError::ServerStartup(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| PrerenderError::ServerStartup(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                error!("Static server error: {e}");
            }
        });

        debug!("Static server listening on {addr}");
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Origin the browser should navigate against, e.g. `http://127.0.0.1:39311`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Fetches the index document once to confirm the server answers before
    /// a browser is launched against it.
    pub async fn probe(&self) -> Result<(), PrerenderError> {
        let response = reqwest::get(self.base_url())
            .await
            .map_err(|e| PrerenderError::ServerStartup(format!("Readiness probe failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PrerenderError::ServerStartup(format!(
                "Readiness probe returned {}; is the static directory missing index.html?",
                response.status()
            )));
        }

        Ok(())
    }

    /// Stops accepting connections and waits for the serve task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!("Static server on {} stopped", self.addr);
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn build_router(static_dir: &Path, index_html: Option<&str>) -> Router {
    let serve_dir = ServeDir::new(static_dir).append_index_html_on_directories(true);

    match index_html {
        Some(html) => {
            let html: Arc<str> = Arc::from(html);
            let fallback = move || {
                let html = html.clone();
                async move { Html(html.to_string()) }
            };
            Router::new().fallback_service(serve_dir.not_found_service(fallback.into_service()))
        }
        None => {
            let index = static_dir.join("index.html");
            Router::new().fallback_service(serve_dir.not_found_service(ServeFile::new(index)))
        }
    }
}
