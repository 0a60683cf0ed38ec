//! Kestrel: ranks nearby eBird hotspots by recent activity.
//!
//! The library covers location resolution, hotspot lookup, observation
//! fetching, aggregation and ranking. Transports (the bundled CLI, or an HTTP
//! server) sit on top of [`ranking::RankingPipeline`].

pub mod aggregate;
pub mod client;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod geo;
pub mod output;
pub mod ranking;
pub mod record;
pub mod util;

pub use error::{ErrorPayload, KestrelError, Result};
