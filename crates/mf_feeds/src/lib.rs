pub mod engine;
pub mod fetcher;
pub mod logging;

pub use engine::{EngineState, ScanEngine};
pub use fetcher::{parse_feed, HttpFeedFetcher};
pub use logging::{init_logging, LogSettings, TracingObserver};

pub mod prelude {
    pub use super::engine::{EngineState, ScanEngine};
    pub use mf_core::{Article, Error, FeedSetConfig, Result, ScanReport};
}
