use anyhow::Context;
use clap::Parser;
use mf_core::{Observer, ShutdownCoordinator};
use mf_feeds::logging::DEFAULT_LOG_FILE;
use mf_feeds::{init_logging, HttpFeedFetcher, LogSettings, ScanEngine, TracingObserver};
use mf_storage::backends::sqlite::DEFAULT_DB_PATH;
use mf_storage::StorageKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

mod config;
mod signals;

#[derive(Parser, Debug)]
#[command(author, version, about = "Forward new feed articles to a Mattermost webhook", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file. Discovered in the working directory when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seen-article storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: StorageKind,
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
    /// Log notifications instead of posting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref()).context("error loading config")?;

    init_logging(&LogSettings {
        log_file: cli.log_file.clone(),
        output_to_terminal: config.logging.output_to_terminal,
    })
    .with_context(|| format!("failed to open log file {}", cli.log_file.display()))?;

    let storage_observer = TracingObserver::new().with_prefix("[storage]".to_string());
    let store = mf_storage::create_storage(cli.storage, &cli.db_path, &storage_observer)
        .await
        .context("error initializing database")?;

    let observer: Arc<dyn Observer> =
        Arc::new(storage_observer.with_new_prefixes("[feeds]".to_string()));

    let fetcher = Arc::new(HttpFeedFetcher::new()?);
    let notifier = mf_notify::create_notifier(&config.mattermost.secret_url, cli.dry_run)?;
    info!("📣 Notifications go through {}", notifier.name());

    let engine = ScanEngine::new(config.feed_set(), store, fetcher, observer)?;

    let coordinator = Arc::new(ShutdownCoordinator::new());
    signals::install_signal_handlers(coordinator.clone());

    let scanner: JoinHandle<mf_core::Result<()>> = tokio::spawn({
        let signal = coordinator.subscribe();
        async move { engine.run(signal, notifier.as_ref()).await }
    });

    let port = config.port();
    let api: JoinHandle<mf_core::Result<()>> = tokio::spawn({
        let signal = coordinator.subscribe();
        async move {
            let listener = mf_web::bind(port).await?;
            mf_web::serve(listener, signal).await
        }
    });

    let (scanner, api) = tokio::join!(scanner, api);
    report_task("feed scanner", scanner);
    report_task("API server", api);

    info!("All tasks finished, shutting down.");
    Ok(())
}

fn report_task(name: &str, outcome: Result<mf_core::Result<()>, tokio::task::JoinError>) {
    match outcome {
        Ok(Ok(())) => info!("{} finished", name),
        Ok(Err(e)) => error!("{} failed: {}", name, e),
        Err(e) => error!("{} panicked or was cancelled: {}", name, e),
    }
}
