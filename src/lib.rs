// YouTube queue engine
// Search aggregation over the YouTube Data API and an endless "up next" queue.
//
// Layout:
// - youtube: the upstream catalog (trait + HTTP client, URL and duration parsing)
// - classify: title normalization, short-form detection, genre inference
// - search: paginated, duration-filtered search sessions
// - player: the playback queue and the continuation mixer that keeps it fed
// - ui: the console front end used by the binary

pub mod classify;
pub mod config;
pub mod error;
pub mod generation;
pub mod player;
pub mod search;
pub mod ui;
pub mod youtube;

pub use config::AppConfig;
pub use error::{CatalogError, ConfigError};
pub use player::mixer::{MixOutcome, QueueMixer};
pub use player::queue::{PlaybackQueue, QueueEvent, QueueHandle};
pub use search::{DurationFilter, PageOutcome, SearchAggregator};
pub use youtube::api::{CatalogApi, YouTubeDataApi};
pub use youtube::models::{Candidate, Provenance};
