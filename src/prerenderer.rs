//! Run orchestration: static server, browser, and the bounded route runner
//!
//! A run starts the ephemeral server, launches the browser, renders every
//! configured route through the concurrency limiter, writes each result to
//! disk, and tears both resources down whether the run succeeded or not.

use crate::config::{PrerenderConfig, RouteRender};
use crate::error::PrerenderError;
use crate::limit::RouteLimiter;
use crate::output::write_route_html;
use crate::renderer::{RenderContext, Renderer};
use crate::server::StaticServer;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::info;

/// Drives a full prerender run
///
/// # Examples
///
/// ```rust,no_run
/// use prerender_tool::{Prerenderer, PrerenderConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = PrerenderConfig {
///         routes: vec!["/".to_string(), "/about".to_string()],
///         static_dir: "./dist".into(),
///         ..Default::default()
///     };
///
///     let results = Prerenderer::new(config).run().await?;
///     for render in &results {
///         println!("{} -> {}", render.route, render.output_path.display());
///     }
///     Ok(())
/// }
/// ```
pub struct Prerenderer {
    config: Arc<PrerenderConfig>,
}

impl Prerenderer {
    pub fn new(config: PrerenderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Renders every configured route and returns the results in input
    /// order.
    ///
    /// A single route's failure fails the whole run; there are no partial
    /// results. The server and browser are closed before this returns, on
    /// the failure path as well as the success path.
    pub async fn run(&self) -> Result<Vec<RouteRender>, PrerenderError> {
        self.config.validate()?;

        let started = Instant::now();
        info!("[prerendering] prerendering started");

        let server =
            StaticServer::start(&self.config.static_dir, self.config.index_html.as_deref())
                .await?;
        info!("[prerendering] server launched: {}", server.base_url());

        if let Err(e) = server.probe().await {
            server.shutdown().await;
            return Err(e);
        }

        let renderer = match Renderer::launch(&self.config).await {
            Ok(renderer) => Arc::new(renderer),
            Err(e) => {
                server.shutdown().await;
                return Err(e);
            }
        };

        let ctx = Arc::new(RenderContext {
            config: self.config.clone(),
            base_url: server.base_url(),
        });

        let outcome = self.render_all(renderer.clone(), ctx).await;

        renderer.close().await;
        server.shutdown().await;

        let results = outcome?;
        info!(
            "[prerendering] prerendering completed ({} routes in {:?})",
            results.len(),
            started.elapsed()
        );
        Ok(results)
    }

    async fn render_all(
        &self,
        renderer: Arc<Renderer>,
        ctx: Arc<RenderContext>,
    ) -> Result<Vec<RouteRender>, PrerenderError> {
        let limiter = RouteLimiter::new(self.config.max_concurrent_routes);

        let tasks: Vec<_> = self
            .config
            .routes
            .iter()
            .cloned()
            .map(|route| {
                let renderer = renderer.clone();
                let ctx = ctx.clone();
                let limiter = limiter.clone();

                tokio::spawn(async move {
                    let _permit = limiter.acquire().await?;
                    render_route_job(&renderer, &ctx, &route).await
                })
            })
            .collect();

        // try_join_all preserves the order of the task list, so results come
        // back in input route order regardless of completion order.
        let joined = try_join_all(tasks)
            .await
            .map_err(|e| PrerenderError::TaskJoin(e.to_string()))?;

        joined.into_iter().collect()
    }
}

/// Renders one route end to end: page render, timeout, file write.
async fn render_route_job(
    renderer: &Renderer,
    ctx: &RenderContext,
    route: &str,
) -> Result<RouteRender, PrerenderError> {
    let started = Instant::now();

    let html = match timeout(ctx.config.render_timeout, renderer.render_route(ctx, route)).await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(PrerenderError::Timeout {
                route: route.to_string(),
                timeout: ctx.config.render_timeout,
            })
        }
    };

    let output_path = write_route_html(&ctx.config.static_dir, route, &html).await?;
    info!("[prerendering] completed route {route}");

    Ok(RouteRender {
        route: route.to_string(),
        html,
        output_path,
        duration: started.elapsed(),
    })
}

/// Convenience wrapper for one-shot library use.
pub async fn prerender(config: PrerenderConfig) -> Result<Vec<RouteRender>, PrerenderError> {
    Prerenderer::new(config).run().await
}
