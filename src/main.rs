use clap::Parser;
use prerender_tool::{load_config, setup_logging, Cli, Prerenderer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting prerender-tool v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;

    match Prerenderer::new(config).run().await {
        Ok(results) => {
            println!("Prerendered {} routes:", results.len());
            for render in &results {
                println!(
                    "  {} -> {} ({} bytes, {:?})",
                    render.route,
                    render.output_path.display(),
                    render.html.len(),
                    render.duration
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Prerendering failed: {e}");
            std::process::exit(1);
        }
    }
}
