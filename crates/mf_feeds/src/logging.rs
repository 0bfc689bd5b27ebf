use mf_core::{Event, Observer};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_LOG_FILE: &str = "matterfeed.log";

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub log_file: PathBuf,
    pub output_to_terminal: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            output_to_terminal: false,
        }
    }
}

/// Install the global subscriber: always append to the log file, and mirror
/// to stdout when requested. A subscriber that is already set is kept.
pub fn init_logging(settings: &LogSettings) -> std::io::Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let terminal_layer = settings
        .output_to_terminal
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    // try_init only fails if another thread won the race; that subscriber stays.
    let _ = tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(file_layer)
        .with(terminal_layer)
        .try_init();
    Ok(())
}

/// Observer that writes events through `tracing`, optionally prefixed.
pub struct TracingObserver {
    prefixes: VecDeque<String>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_new_prefixes(mut self, prefix: String) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix);
        self
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefixes.push_back(prefix);
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn render(&self, event: &Event) -> String {
        let message = match event {
            Event::EngineStarted { feeds, interval_secs, cutoff } => format!(
                "watching {} feed(s) every {}s, reporting articles published after {}",
                feeds,
                interval_secs,
                cutoff.to_rfc3339()
            ),
            Event::PassStarted { feeds } => format!("starting feed scan of {} feed(s)", feeds),
            Event::FetchFailed { url, error } => format!("failed fetching feed {}: {}", url, error),
            Event::ArticleNotified { title, link, .. } => format!("notified: {} - {}", title, link),
            Event::NotifyFailed { id, error } => {
                format!("failed sending notification for {}: {}", id, error)
            }
            Event::LookupFailed { id, error } => {
                format!("failed querying seen articles for {}: {}", id, error)
            }
            Event::RecordFailed { id, error } => {
                format!("failed inserting seen article {}: {}", id, error)
            }
            Event::PassFinished(report) => format!(
                "feed scan finished: {} article(s) from {} feed(s), {} notified, {} fetch error(s), {} notify error(s)",
                report.articles,
                report.feeds,
                report.notified,
                report.fetch_failures,
                report.notify_failures
            ),
            Event::EngineStopped { passes } => format!("feed scanner stopped after {} pass(es)", passes),
            Event::StoreOpened { backend, records } => {
                format!("{} storage ready with {} seen article(s)", backend, records)
            }
            Event::StoreRetry { attempt, max_attempts, error } => format!(
                "database is busy, retrying... ({}/{}): {}",
                attempt, max_attempts, error
            ),
        };
        format!("{}{}", self.prefix(), message)
    }

    pub fn level(event: &Event) -> Level {
        match event {
            Event::FetchFailed { .. }
            | Event::NotifyFailed { .. }
            | Event::LookupFailed { .. }
            | Event::RecordFailed { .. } => Level::ERROR,
            Event::StoreRetry { .. } => Level::WARN,
            _ => Level::INFO,
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for TracingObserver {
    fn observe(&self, event: Event) {
        let message = self.render(&event);
        match Self::level(&event) {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            _ => tracing::info!("{}", message),
        }
    }
}
