//! CLI command implementations

use crate::output::{render_catalog, render_details, render_playback, OutputFormat};
use crate::player::{self, PlayOptions};
use indicatif::{ProgressBar, ProgressStyle};
use marquee_core::{
    Catalog, CatalogLoader, CatalogSource, Error, MarqueeConfig, MediaRecord, Navigator, Route,
    StaticCatalog,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Load configuration from `path`, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<MarqueeConfig> {
    match path {
        Some(path) => {
            let config = MarqueeConfig::load(path)?;
            debug!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(MarqueeConfig::default()),
    }
}

fn build_source(config: &MarqueeConfig) -> anyhow::Result<Arc<dyn CatalogSource>> {
    let source = match &config.catalog.path {
        Some(path) => StaticCatalog::from_json_file(path)?,
        None => StaticCatalog::demo(),
    };
    Ok(Arc::new(
        source.with_latency(Duration::from_millis(config.catalog.latency_ms)),
    ))
}

/// Mount a loader and wait for it to settle
async fn fetch_catalog(config: &MarqueeConfig) -> anyhow::Result<Catalog> {
    let loader = CatalogLoader::mount(build_source(config)?);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Loading movies...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let state = loader.settled().await;
    spinner.finish_and_clear();
    loader.unmount();

    match (state.data, state.error) {
        (Some(catalog), _) => Ok(catalog),
        (None, Some(message)) => anyhow::bail!("{}", message),
        (None, None) => anyhow::bail!("{}", marquee_core::CATALOG_FALLBACK_ERROR),
    }
}

fn find(catalog: &Catalog, id: &str) -> anyhow::Result<MediaRecord> {
    catalog
        .get_by_id(id)
        .cloned()
        .ok_or_else(|| Error::MediaNotFound { id: id.to_string() }.into())
}

/// List the catalog
pub async fn list(config: &MarqueeConfig, format: &str) -> anyhow::Result<()> {
    let catalog = fetch_catalog(config).await?;
    println!("{}", render_catalog(&catalog, OutputFormat::from(format)));
    Ok(())
}

/// Show details for one title
pub async fn show(config: &MarqueeConfig, id: &str, format: &str) -> anyhow::Result<()> {
    let catalog = fetch_catalog(config).await?;
    let item = find(&catalog, id)?;
    println!("{}", render_details(&item, OutputFormat::from(format)));
    Ok(())
}

/// Play a title from home through details into the player
pub async fn play(
    config: &MarqueeConfig,
    id: &str,
    options: PlayOptions,
    format: &str,
) -> anyhow::Result<()> {
    let catalog = fetch_catalog(config).await?;
    let item = find(&catalog, id)?;

    let mut navigator = Navigator::new();
    navigator.navigate(Route::Details(item.clone()));
    navigator.navigate(Route::Player(item.clone()));
    info!(route = %navigator.current(), "Starting playback");

    let (phase, state) = player::run(&item, config, options).await?;
    println!("{}", render_playback(id, phase, &state, OutputFormat::from(format)));

    if state.error.is_some() {
        // Going back is the only way out of an errored player
        navigator.go_back();
        warn!(route = %navigator.current(), "Returned after playback error");
    }

    Ok(())
}
