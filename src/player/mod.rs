// Playback queue and the continuation mixer that keeps it fed
pub mod flight;
pub mod mixer;
pub mod queue;
pub mod sampler;
