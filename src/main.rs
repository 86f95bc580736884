// Main entry point for the YouTube queue console
// Loads config, builds the catalog client and hands off to the console loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use youtube_queue_engine::ui::app::ConsoleApp;
use youtube_queue_engine::{AppConfig, CatalogApi, QueueHandle, QueueMixer, SearchAggregator, YouTubeDataApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs on stderr; stdout belongs to the console listing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let api: Arc<dyn CatalogApi> = Arc::new(
        YouTubeDataApi::from_config(&config)
            .context("Set YOUTUBE_API_KEY or api_key in the config file")?,
    );
    info!(base = %config.api_base_url, "catalog client ready");

    let search = SearchAggregator::new(Arc::clone(&api), config.search.clone());
    let mixer = Arc::new(QueueMixer::new(api, config.mixer.clone()));
    let queue = Arc::new(QueueHandle::new());

    let mut app = ConsoleApp::new(search, queue, mixer);
    app.run().await
}
