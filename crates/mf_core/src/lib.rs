pub mod error;
pub mod feeds;
pub mod notify;
pub mod observe;
pub mod shutdown;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use feeds::{FeedFetcher, FeedSetConfig, MAX_RESCAN_INTERVAL};
pub use notify::{render_message, Notifier};
pub use observe::{Event, NullObserver, Observer, Recorder};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use storage::SeenStore;
pub use types::{Article, ScanReport, SeenRecord};
