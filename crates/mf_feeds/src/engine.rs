//! Periodic feed scanning.
//!
//! [`ScanEngine`] owns the scan cadence. Each tick runs one pass over the
//! configured feeds in order; an article is handed to the notifier only if it
//! was published after the engine started and has no seen record yet. A seen
//! record is written only after the notifier reports success, so a failed
//! delivery is offered again on the next pass.

use chrono::{DateTime, Utc};
use mf_core::{
    Article, Error, Event, FeedFetcher, FeedSetConfig, Notifier, Observer, Result, ScanReport,
    SeenRecord, SeenStore, ShutdownSignal,
};
use std::sync::{Arc, Mutex};
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopped,
}

pub struct ScanEngine {
    config: FeedSetConfig,
    store: Arc<dyn SeenStore>,
    fetcher: Arc<dyn FeedFetcher>,
    observer: Arc<dyn Observer>,
    state: Mutex<EngineState>,
}

impl ScanEngine {
    pub fn new(
        config: FeedSetConfig,
        store: Arc<dyn SeenStore>,
        fetcher: Arc<dyn FeedFetcher>,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            fetcher,
            observer,
            state: Mutex::new(EngineState::Idle),
        })
    }

    pub fn config(&self) -> &FeedSetConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: EngineState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != EngineState::Idle {
            return Err(Error::EngineState(format!(
                "engine can only be started once (current state: {:?})",
                *state
            )));
        }
        *state = EngineState::Running;
        Ok(())
    }

    /// Scan every `rescan_interval` until `shutdown` fires.
    ///
    /// The first pass runs one full interval after the call, never
    /// immediately. A pass in progress always completes before shutdown is
    /// observed.
    pub async fn run(&self, mut shutdown: ShutdownSignal, notifier: &dyn Notifier) -> Result<()> {
        self.start()?;

        let program_start = Utc::now();
        let period = self.config.rescan_interval;
        self.observer.observe(Event::EngineStarted {
            feeds: self.config.urls.len(),
            interval_secs: period.as_secs(),
            cutoff: program_start,
        });

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut passes = 0u64;
        while !shutdown.is_cancelled() {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.scan_once(program_start, notifier).await;
                    passes += 1;
                }
            }
        }

        self.set_state(EngineState::Stopped);
        self.observer.observe(Event::EngineStopped { passes });
        Ok(())
    }

    /// Run a single pass over all feeds, treating `cutoff` as the engine start time.
    pub async fn scan_once(&self, cutoff: DateTime<Utc>, notifier: &dyn Notifier) -> ScanReport {
        let mut report = ScanReport {
            feeds: self.config.urls.len(),
            ..ScanReport::default()
        };
        self.observer.observe(Event::PassStarted { feeds: report.feeds });

        for url in &self.config.urls {
            let articles = match self.fetcher.fetch(url).await {
                Ok(articles) => articles,
                Err(e) => {
                    report.fetch_failures += 1;
                    self.observer.observe(Event::FetchFailed {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            report.articles += articles.len();
            for article in &articles {
                self.process_article(article, cutoff, notifier, &mut report).await;
            }
        }

        self.observer.observe(Event::PassFinished(report));
        report
    }

    async fn process_article(
        &self,
        article: &Article,
        cutoff: DateTime<Utc>,
        notifier: &dyn Notifier,
        report: &mut ScanReport,
    ) {
        if !article.published_after(cutoff) {
            return;
        }

        match self.store.exists(&article.id).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                report.lookup_failures += 1;
                self.observer.observe(Event::LookupFailed {
                    id: article.id.clone(),
                    error: e.to_string(),
                });
                return;
            }
        }

        report.offered += 1;
        if let Err(e) = notifier.send(&article.title, &article.link).await {
            report.notify_failures += 1;
            self.observer.observe(Event::NotifyFailed {
                id: article.id.clone(),
                error: e.to_string(),
            });
            return;
        }

        report.notified += 1;
        self.observer.observe(Event::ArticleNotified {
            id: article.id.clone(),
            title: article.title.clone(),
            link: article.link.clone(),
        });

        let record = SeenRecord::from_article(article, Utc::now());
        if let Err(e) = self.store.record(&record).await {
            report.record_failures += 1;
            self.observer.observe(Event::RecordFailed {
                id: article.id.clone(),
                error: e.to_string(),
            });
        }
    }
}
