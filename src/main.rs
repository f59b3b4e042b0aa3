//! statemap - render a U.S. state and its ZIP codes over an OpenStreetMap basemap
//!
//! This is the main entry point for the statemap application.

use tracing::{error, info};

use statemap::logging::{init_tracing, log_timed_operation};
use statemap::tiles::{init_cache, CachedTileSource, HttpTileSource};
use statemap::{render_state, Config, RenderContext, Result};

fn main() -> Result<()> {
    // Load configuration
    let (config, target) = Config::load()?;

    init_tracing(&config.log_level);
    info!("Starting statemap v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let cache = init_cache(&config.tiles.cache_dir)?;
    let http = HttpTileSource::new(&config.tiles.url_template, &config.tiles.user_agent)?;
    let tiles = CachedTileSource::new(http, cache);

    let ctx = RenderContext::from_config(&config, &tiles);

    let rendered = log_timed_operation("render_state", || {
        render_state(
            &target.state,
            &target.zip_state,
            &config.inputs.zip_csv,
            &ctx,
        )
    })
    .map_err(|e| {
        error!("Render failed: {}", e);
        e
    })?;

    info!(
        "Wrote {} ({}x{}, {} markers)",
        rendered.path.display(),
        rendered.width,
        rendered.height,
        rendered.markers
    );
    Ok(())
}
