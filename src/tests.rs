#[cfg(test)]
mod integration_tests {
    use crate::{PrerenderConfig, Prerenderer, RenderWait, StaticServer};
    use std::time::Duration;

    #[test]
    fn test_config_default() {
        let config = PrerenderConfig::default();
        assert!(config.routes.is_empty());
        assert!(config.index_html.is_none());
        assert_eq!(config.wait, RenderWait::Immediate);
        assert!(!config.skip_third_party_requests);
        assert_eq!(config.max_concurrent_routes, 0);
        assert_eq!(config.render_timeout, Duration::from_secs(30));
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_render_wait_precedence() {
        // Event wins over delay, delay over immediate.
        assert_eq!(
            RenderWait::resolve(
                Some("app-rendered".to_string()),
                Some(Duration::from_millis(500))
            ),
            RenderWait::AfterEvent("app-rendered".to_string())
        );
        assert_eq!(
            RenderWait::resolve(None, Some(Duration::from_millis(500))),
            RenderWait::AfterDelay(Duration::from_millis(500))
        );
        assert_eq!(RenderWait::resolve(None, None), RenderWait::Immediate);
    }

    #[test]
    fn test_config_validation() {
        let dir = tempfile::tempdir().unwrap();

        let valid = PrerenderConfig {
            routes: vec!["/".to_string(), "/about".to_string()],
            static_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let no_routes = PrerenderConfig {
            routes: Vec::new(),
            static_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(no_routes.validate().is_err());

        let bad_route = PrerenderConfig {
            routes: vec!["about".to_string()],
            static_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(bad_route.validate().is_err());

        let traversal = PrerenderConfig {
            routes: vec!["/../outside".to_string()],
            static_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(traversal.validate().is_err());

        let missing_dir = PrerenderConfig {
            routes: vec!["/".to_string()],
            static_dir: dir.path().join("does-not-exist"),
            ..Default::default()
        };
        assert!(missing_dir.validate().is_err());

        let bad_event = PrerenderConfig {
            routes: vec!["/".to_string()],
            static_dir: dir.path().to_path_buf(),
            wait: RenderWait::AfterEvent("x'); alert('x".to_string()),
            ..Default::default()
        };
        assert!(bad_event.validate().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "routes": ["/", "/docs"],
            "static_dir": "./site",
            "skip_third_party_requests": true,
            "max_concurrent_routes": 2,
            "wait": { "after_event": "app-rendered" }
        }"#;

        let config: PrerenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.routes, vec!["/", "/docs"]);
        assert!(config.skip_third_party_requests);
        assert_eq!(config.max_concurrent_routes, 2);
        assert_eq!(
            config.wait,
            RenderWait::AfterEvent("app-rendered".to_string())
        );
        // Omitted fields fall back to defaults.
        assert_eq!(config.render_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_chrome_args_generation() {
        let args = crate::get_chrome_args();
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
    }

    async fn write_fixture_site(dir: &std::path::Path) {
        tokio::fs::write(
            dir.join("index.html"),
            "<html><body>hi</body></html>",
        )
        .await
        .unwrap();
        tokio::fs::write(dir.join("app.js"), "console.log('app');")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_serves_static_files() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let server = StaticServer::start(dir.path(), None).await.unwrap();
        let base = server.base_url();

        let body = reqwest::get(format!("{base}/app.js"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "console.log('app');");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_server_falls_back_to_index_for_routes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let server = StaticServer::start(dir.path(), None).await.unwrap();
        let base = server.base_url();

        // A client-side route has no file behind it; the index document
        // answers instead.
        let body = reqwest::get(format!("{base}/some/client/route"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "<html><body>hi</body></html>");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_server_uses_supplied_index_html() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let custom = "<html><body>custom shell</body></html>";
        let server = StaticServer::start(dir.path(), Some(custom)).await.unwrap();
        let base = server.base_url();

        let body = reqwest::get(format!("{base}/missing"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, custom);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_servers_get_distinct_ephemeral_ports() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let first = StaticServer::start(dir.path(), None).await.unwrap();
        let second = StaticServer::start(dir.path(), None).await.unwrap();

        assert_ne!(first.addr().port(), 0);
        assert_ne!(first.addr().port(), second.addr().port());

        first.shutdown().await;
        second.shutdown().await;
    }

    #[tokio::test]
    async fn test_server_probe() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let server = StaticServer::start(dir.path(), None).await.unwrap();
        assert!(server.probe().await.is_ok());
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_prerender_run_with_chrome() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture_site(dir.path()).await;

        let config = PrerenderConfig {
            routes: vec!["/a".to_string(), "/b".to_string()],
            static_dir: dir.path().to_path_buf(),
            max_concurrent_routes: 1,
            render_timeout: Duration::from_secs(20),
            ..Default::default()
        };

        match Prerenderer::new(config).run().await {
            Ok(results) => {
                assert_eq!(results.len(), 2);
                // Input order is preserved.
                assert_eq!(results[0].route, "/a");
                assert_eq!(results[1].route, "/b");

                for route in ["a", "b"] {
                    let path = dir.path().join(route).join("index.html");
                    assert!(path.is_file(), "missing output for /{route}");
                    let html = tokio::fs::read_to_string(&path).await.unwrap();
                    assert!(html.contains("hi"));
                }
            }
            Err(e) => {
                // Chrome is not available in every environment.
                eprintln!("Prerender run failed (may be expected without Chrome): {e:?}");
            }
        }
    }
}
