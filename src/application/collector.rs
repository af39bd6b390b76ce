//! Collector: renders listing pages and downloads every result image
//!
//! The page loop owns the browser session. Each page's entries are parsed
//! into owned values and handed to a bounded pool of entry tasks; the loop
//! waits for all of them before rendering the next page.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::download_ledger::{Claim, DownloadLedger};
use crate::domain::image_record::{ImageName, ImageRecord};
use crate::domain::page_window::PageWindow;
use crate::domain::scan_type::detect_scan_types;
use crate::error::{HarvestError, HarvestResult};
use crate::infrastructure::browser::PageRenderer;
use crate::infrastructure::config::{AppConfig, CollectorConfig};
use crate::infrastructure::dataset::{DatasetWriter, load_downloaded_names};
use crate::infrastructure::http_client::ImageFetcher;
use crate::infrastructure::listing_parser::{ListingEntry, ListingParser};

/// What happened to one entry that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Downloaded(ImageName),
    AlreadyDownloaded(ImageName),
    AlreadyClaimed(ImageName),
}

/// Counters for one collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub pages_rendered: u32,
    pub pages_skipped: u32,
    pub downloaded: usize,
    pub already_downloaded: usize,
    pub already_claimed: usize,
    pub failed: usize,
    /// Set when a non-recoverable failure ended the run early
    pub halted: bool,
}

impl CollectionStats {
    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Downloaded(_) => self.downloaded += 1,
            EntryOutcome::AlreadyDownloaded(_) => self.already_downloaded += 1,
            EntryOutcome::AlreadyClaimed(_) => self.already_claimed += 1,
        }
    }
}

/// Per-entry work shared by all pool tasks
pub struct EntryWorker {
    fetcher: ImageFetcher,
    ledger: DownloadLedger,
    dataset: DatasetWriter,
    image_dir: PathBuf,
    image_base_url: String,
    results_per_page: u32,
}

impl EntryWorker {
    pub fn new(
        fetcher: ImageFetcher,
        ledger: DownloadLedger,
        dataset: DatasetWriter,
        image_dir: impl Into<PathBuf>,
        config: &CollectorConfig,
    ) -> HarvestResult<Self> {
        let image_dir = image_dir.into();
        std::fs::create_dir_all(&image_dir)?;
        Ok(Self {
            fetcher,
            ledger,
            dataset,
            image_dir,
            image_base_url: config.image_base_url.clone(),
            results_per_page: config.results_per_page,
        })
    }

    /// Snapshot recorded names, open the dataset and build the HTTP client
    pub fn from_config(config: &AppConfig) -> HarvestResult<Self> {
        // The snapshot is taken before the writer can create the file
        let ledger = DownloadLedger::new(load_downloaded_names(&config.storage.dataset_path)?);
        let dataset = DatasetWriter::open(&config.storage.dataset_path)?;
        let fetcher = ImageFetcher::new(config.http.clone())?;
        Self::new(fetcher, ledger, dataset, &config.storage.image_dir, &config.collector)
    }

    /// Extract, download and record one entry
    pub async fn process(&self, page: u32, entry: ListingEntry) -> HarvestResult<EntryOutcome> {
        let image_url = entry.image_url(&self.image_base_url)?;
        let image_name = ImageName::for_entry(page, entry.index, self.results_per_page);

        match self.ledger.try_claim(&image_name)? {
            Claim::Granted => {}
            Claim::AlreadyDownloaded => {
                debug!(image = %image_name, "⏭️ Skipped (already downloaded)");
                return Ok(EntryOutcome::AlreadyDownloaded(image_name));
            }
            Claim::AlreadyClaimed => {
                debug!(image = %image_name, "⏭️ Skipped (claimed by another worker)");
                return Ok(EntryOutcome::AlreadyClaimed(image_name));
            }
        }

        let scan_types = entry
            .caption
            .as_deref()
            .map(detect_scan_types)
            .unwrap_or_default()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let bytes = self.fetcher.fetch_bytes(&image_url).await?;
        tokio::fs::write(self.image_dir.join(image_name.as_str()), &bytes).await?;

        let record = ImageRecord {
            image_name: image_name.clone(),
            scan_types,
            description: entry.caption,
            bottom_line: entry.bottom_line,
            image_url,
        };
        self.dataset.append(&record)?;

        info!(image = %image_name, bytes = bytes.len(), "✅ Downloaded");
        Ok(EntryOutcome::Downloaded(image_name))
    }
}

/// Page loop driving one browser session and the entry pool
pub struct Collector<R: PageRenderer> {
    renderer: R,
    parser: ListingParser,
    worker: Arc<EntryWorker>,
    pool: Arc<Semaphore>,
    config: CollectorConfig,
    cancel: CancellationToken,
}

impl<R: PageRenderer> Collector<R> {
    pub fn new(renderer: R, worker: EntryWorker, config: CollectorConfig) -> HarvestResult<Self> {
        let parser = ListingParser::new(&config.selectors)?;
        let pool = Arc::new(Semaphore::new(config.max_workers.max(1)));
        Ok(Self {
            renderer,
            parser,
            worker: Arc::new(worker),
            pool,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Stop before the next page once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Visit every page, then release the browser session whatever happened
    pub async fn run(mut self) -> CollectionStats {
        info!(
            pages = self.config.page_count,
            workers = self.config.max_workers,
            previously_downloaded = self.worker.ledger.previously_downloaded(),
            dataset = %self.worker.dataset.path().display(),
            "🚀 Starting collection"
        );

        let stats = self.collect_pages().await;

        if let Err(e) = self.renderer.close().await {
            warn!(error = %e, "Browser session did not close cleanly");
        }

        info!(
            downloaded = stats.downloaded,
            already_downloaded = stats.already_downloaded,
            already_claimed = stats.already_claimed,
            failed = stats.failed,
            pages_rendered = stats.pages_rendered,
            pages_skipped = stats.pages_skipped,
            halted = stats.halted,
            "🎉 Collection complete"
        );
        stats
    }

    async fn collect_pages(&mut self) -> CollectionStats {
        let mut stats = CollectionStats::default();
        let ready_timeout = Duration::from_secs(self.config.ready_timeout_seconds);

        for page in 0..self.config.page_count {
            if self.cancel.is_cancelled() {
                info!(page = page + 1, "Cancellation requested, stopping before page");
                break;
            }

            let window = PageWindow::new(page, self.config.results_per_page);
            let url = window.listing_url(&self.config.listing_url_template);
            info!(page = window.display_number(), %url, "🔍 Scraping page");

            let rendered = tokio::select! {
                result = self.renderer.render(&url, &self.config.selectors.entry, ready_timeout) => result,
                () = self.cancel.cancelled() => {
                    info!(page = window.display_number(), "Cancellation requested while rendering");
                    break;
                }
            };

            let html = match rendered {
                Ok(html) => html,
                Err(e) if !e.is_recoverable() => {
                    error!(page = window.display_number(), error = %e, "🛑 Stopping collection");
                    stats.halted = true;
                    break;
                }
                Err(e) => {
                    warn!(page = window.display_number(), error = %e, "⚠️ Skipping page");
                    stats.pages_skipped += 1;
                    continue;
                }
            };

            let entries = self.parser.parse_entries(&html);
            if entries.is_empty() {
                warn!(page = window.display_number(), "⚠️ No entries found on page");
                stats.pages_skipped += 1;
                continue;
            }

            stats.pages_rendered += 1;
            if let Err(e) = self.dispatch_page(page, entries, &mut stats).await {
                error!(page = window.display_number(), error = %e, "🛑 Stopping collection");
                stats.halted = true;
                break;
            }
        }

        stats
    }

    /// Run every entry of one page on the pool and wait for all of them
    ///
    /// Returns the first non-recoverable entry error once the page has drained.
    async fn dispatch_page(
        &self,
        page: u32,
        entries: Vec<ListingEntry>,
        stats: &mut CollectionStats,
    ) -> HarvestResult<()> {
        let mut tasks = JoinSet::new();
        for entry in entries {
            let worker = Arc::clone(&self.worker);
            let pool = Arc::clone(&self.pool);
            tasks.spawn(async move {
                let index = entry.index;
                // the pool is never closed, so acquiring only waits
                let _permit = pool.acquire_owned().await;
                (index, worker.process(page, entry).await)
            });
        }

        let mut fatal: Option<HarvestError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => stats.record(&outcome),
                Ok((index, Err(e))) if !e.is_recoverable() => {
                    stats.failed += 1;
                    error!(page = page + 1, index, error = %e, "Entry failed beyond recovery");
                    fatal.get_or_insert(e);
                }
                Ok((index, Err(e))) => {
                    stats.failed += 1;
                    warn!(page = page + 1, index, error = %e, "⚠️ Failed to harvest entry");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(page = page + 1, error = %e, "Entry task aborted");
                }
            }
        }

        fatal.map_or(Ok(()), Err)
    }
}
