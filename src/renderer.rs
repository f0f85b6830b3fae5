//! Headless browser lifecycle and per-route page rendering
//!
//! This module owns the Chrome process for the duration of a run and renders
//! individual routes: open a page, optionally filter third-party requests,
//! navigate, wait for the configured render signal, and capture the
//! serialized DOM.

use crate::config::{create_browser_config, PrerenderConfig, RenderWait};
use crate::error::PrerenderError;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Shared, read-only state threaded through every render job.
pub struct RenderContext {
    pub config: Arc<PrerenderConfig>,
    pub base_url: String,
}

/// Owned handle to the headless browser; closed explicitly at the end of a
/// run, on both the success and the failure path.
pub struct Renderer {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
}

impl Renderer {
    /// Launches Chrome and starts the CDP event loop.
    pub async fn launch(config: &PrerenderConfig) -> Result<Self, PrerenderError> {
        let browser_config = create_browser_config(config)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| PrerenderError::BrowserLaunch(e.to_string()))?;

        // The handler implements Stream and must be polled for the browser
        // connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {e}");
                }
            }
            debug!("CDP handler stream ended");
        });

        info!("Browser launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler: handler_task,
        })
    }

    /// Renders one route and returns the captured HTML.
    pub async fn render_route(
        &self,
        ctx: &RenderContext,
        route: &str,
    ) -> Result<String, PrerenderError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| PrerenderError::Navigation {
                    route: route.to_string(),
                    message: e.to_string(),
                })?
        };

        let result = render_on_page(&page, ctx, route).await;
        let _ = page.close().await;
        result
    }

    /// Closes the browser and stops the CDP event loop.
    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {e}");
        }
        self.handler.abort();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn render_on_page(
    page: &Page,
    ctx: &RenderContext,
    route: &str,
) -> Result<String, PrerenderError> {
    if ctx.config.skip_third_party_requests {
        install_request_filter(page, &ctx.base_url, route).await?;
    }

    // Latch the event on a fresh document in case it fires before the main
    // wait listener below is attached.
    if let RenderWait::AfterEvent(event) = &ctx.config.wait {
        page.evaluate_on_new_document(event_latch_script(event))
            .await
            .map_err(|e| PrerenderError::Evaluation {
                route: route.to_string(),
                message: e.to_string(),
            })?;
    }

    let url = format!("{}{}", ctx.base_url, route);
    page.goto(url.as_str())
        .await
        .map_err(|e| PrerenderError::Navigation {
            route: route.to_string(),
            message: e.to_string(),
        })?;
    page.wait_for_navigation()
        .await
        .map_err(|e| PrerenderError::Navigation {
            route: route.to_string(),
            message: e.to_string(),
        })?;

    info!("[prerendering] rendering route {route}");

    match &ctx.config.wait {
        RenderWait::Immediate => {}
        RenderWait::AfterEvent(event) => {
            let params = EvaluateParams::builder()
                .expression(wait_for_event_script(event))
                .await_promise(true)
                .build()
                .map_err(|e| PrerenderError::Evaluation {
                    route: route.to_string(),
                    message: e,
                })?;
            page.evaluate(params)
                .await
                .map_err(|e| PrerenderError::Evaluation {
                    route: route.to_string(),
                    message: e.to_string(),
                })?;
        }
        RenderWait::AfterDelay(delay) => {
            tokio::time::sleep(*delay).await;
        }
    }

    page.content().await.map_err(|e| PrerenderError::Capture {
        route: route.to_string(),
        message: e.to_string(),
    })
}

/// Pauses every request on the page and aborts those that leave the local
/// server origin.
async fn install_request_filter(
    page: &Page,
    base_url: &str,
    route: &str,
) -> Result<(), PrerenderError> {
    page.execute(FetchEnableParams::default())
        .await
        .map_err(|e| PrerenderError::Navigation {
            route: route.to_string(),
            message: format!("Request interception setup failed: {e}"),
        })?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| PrerenderError::Navigation {
            route: route.to_string(),
            message: format!("Request interception setup failed: {e}"),
        })?;

    let page = page.clone();
    let base = base_url.to_string();
    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            if is_first_party(&event.request.url, &base) {
                let params = match ContinueRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .build()
                {
                    Ok(params) => params,
                    Err(e) => {
                        warn!("Malformed continue command: {e}");
                        continue;
                    }
                };
                if let Err(e) = page.execute(params).await {
                    debug!("Continue request failed: {e}");
                }
            } else {
                debug!("Aborting third-party request: {}", event.request.url);
                let params = match FailRequestParams::builder()
                    .request_id(event.request_id.clone())
                    .error_reason(ErrorReason::Aborted)
                    .build()
                {
                    Ok(params) => params,
                    Err(e) => {
                        warn!("Malformed abort command: {e}");
                        continue;
                    }
                };
                if let Err(e) = page.execute(params).await {
                    debug!("Abort request failed: {e}");
                }
            }
        }
    });

    Ok(())
}

/// A request is first-party when its origin matches the local server origin.
pub(crate) fn is_first_party(request_url: &str, base_url: &str) -> bool {
    match (Url::parse(request_url), Url::parse(base_url)) {
        (Ok(request), Ok(base)) => request.origin() == base.origin(),
        _ => request_url.starts_with(base_url),
    }
}

fn event_latch_script(event: &str) -> String {
    format!(
        "window.__PRERENDER_STATUS = {{}};\n\
         document.addEventListener('{event}', () => {{\n\
             window.__PRERENDER_STATUS.__DOCUMENT_EVENT_RESOLVED = true;\n\
         }});"
    )
}

fn wait_for_event_script(event: &str) -> String {
    format!(
        "new Promise((resolve) => {{\n\
             if (window.__PRERENDER_STATUS && window.__PRERENDER_STATUS.__DOCUMENT_EVENT_RESOLVED) {{\n\
                 resolve();\n\
                 return;\n\
             }}\n\
             document.addEventListener('{event}', () => resolve());\n\
         }})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_origin_is_first_party() {
        assert!(is_first_party(
            "http://127.0.0.1:4000/app.js",
            "http://127.0.0.1:4000"
        ));
        assert!(is_first_party(
            "http://127.0.0.1:4000/deep/path?q=1",
            "http://127.0.0.1:4000"
        ));
    }

    #[test]
    fn other_origins_are_third_party() {
        assert!(!is_first_party(
            "https://cdn.example.com/lib.js",
            "http://127.0.0.1:4000"
        ));
        // Same host, different port is a different origin.
        assert!(!is_first_party(
            "http://127.0.0.1:4001/app.js",
            "http://127.0.0.1:4000"
        ));
        // Opaque origins never match.
        assert!(!is_first_party("data:text/plain,hi", "http://127.0.0.1:4000"));
    }

    #[test]
    fn wait_script_checks_latch_before_listening() {
        let script = wait_for_event_script("render-ready");
        let latch_check = script.find("__DOCUMENT_EVENT_RESOLVED").unwrap();
        let listener = script.find("addEventListener").unwrap();
        assert!(latch_check < listener);
        assert!(script.contains("render-ready"));
    }

    #[test]
    fn latch_script_records_the_event() {
        let script = event_latch_script("app-rendered");
        assert!(script.contains("addEventListener('app-rendered'"));
        assert!(script.contains("__DOCUMENT_EVENT_RESOLVED = true"));
    }
}
