//! Configuration infrastructure
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Compiled-in defaults (`defaults` and `openi` below)
//! 2. Optional `scan_harvester.{toml,json,yaml}` in the working directory
//! 3. Environment variables such as `SCAN_HARVESTER__COLLECTOR__PAGE_COUNT=3`

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::HarvestResult;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub collector: CollectorConfig,
    pub storage: StorageConfig,
    pub browser: BrowserConfig,
    pub http: HttpClientConfig,
    pub logging: LoggingConfig,
}

/// Page iteration and worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Listing URL with `{m}` / `{n}` placeholders for the result range
    pub listing_url_template: String,

    /// Base URL for resolving relative image sources
    pub image_base_url: String,

    /// Number of listing pages to visit
    pub page_count: u32,

    /// Results requested per listing page
    pub results_per_page: u32,

    /// Maximum concurrent entry workers
    pub max_workers: usize,

    /// Seconds to wait for the first result entry to appear
    pub ready_timeout_seconds: u64,

    pub selectors: ListingSelectors,
}

/// CSS selectors for listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    pub entry: String,
    pub image: String,
    pub caption: String,
    pub bottom_line: String,
}

/// Output locations shared by both stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub image_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub chart_path: PathBuf,
}

/// WebDriver session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver endpoint (chromedriver listens on 9515 by default)
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout_seconds: u64,
    /// Extra Chrome command line arguments
    pub chrome_args: Vec<String>,
}

/// HTTP client configuration for image downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Requests per second across all workers, 0 disables the limiter
    pub max_requests_per_second: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Write a log file in addition to the console
    pub file_logging: bool,
    pub log_dir: PathBuf,
    /// Emit JSON lines to the log file instead of plain text
    pub json_format: bool,
}

/// Default values mirroring the original collection run
pub mod defaults {
    pub const PAGE_COUNT: u32 = 12;
    pub const RESULTS_PER_PAGE: u32 = 100;
    pub const MAX_WORKERS: usize = 6;
    pub const READY_TIMEOUT_SECONDS: u64 = 15;
    pub const PAGE_LOAD_TIMEOUT_SECONDS: u64 = 20;
    pub const IMAGE_TIMEOUT_SECONDS: u64 = 10;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;

    pub const IMAGE_DIR: &str = "brain_scan_images";
    pub const DATASET_PATH: &str = "brain_scan_dataset.csv";
    pub const CHART_PATH: &str = "scan_type_frequency.png";
    pub const LOG_DIR: &str = "logs";

    pub const WEBDRIVER_URL: &str = "http://localhost:9515";
    pub const USER_AGENT: &str = "scan-harvester/0.1 (Research Dataset Collection)";
    pub const LOG_LEVEL: &str = "info";
}

/// Open-i (NLM) image search constants
pub mod openi {
    /// Base URL for resolving relative image sources
    pub const BASE_URL: &str = "https://openi.nlm.nih.gov";

    /// Grid query for "brain scan" over the MedPix collection, `{m}`..`{n}` result range
    pub const LISTING_URL_TEMPLATE: &str =
        "https://openi.nlm.nih.gov/gridquery?coll=mc&it=xg&q=brain%20scan&m={m}&n={n}";

    pub const ENTRY_SELECTOR: &str = ".jg-entry";
    pub const IMAGE_SELECTOR: &str = "img";
    pub const CAPTION_SELECTOR: &str = ".imageToolTipCaption";
    pub const BOTTOM_LINE_SELECTOR: &str = ".imageToolTipBottomLine";
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listing_url_template: openi::LISTING_URL_TEMPLATE.to_string(),
            image_base_url: openi::BASE_URL.to_string(),
            page_count: defaults::PAGE_COUNT,
            results_per_page: defaults::RESULTS_PER_PAGE,
            max_workers: defaults::MAX_WORKERS,
            ready_timeout_seconds: defaults::READY_TIMEOUT_SECONDS,
            selectors: ListingSelectors::default(),
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            entry: openi::ENTRY_SELECTOR.to_string(),
            image: openi::IMAGE_SELECTOR.to_string(),
            caption: openi::CAPTION_SELECTOR.to_string(),
            bottom_line: openi::BOTTOM_LINE_SELECTOR.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from(defaults::IMAGE_DIR),
            dataset_path: PathBuf::from(defaults::DATASET_PATH),
            chart_path: PathBuf::from(defaults::CHART_PATH),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            headless: true,
            page_load_timeout_seconds: defaults::PAGE_LOAD_TIMEOUT_SECONDS,
            chrome_args: vec!["--disable-gpu".to_string(), "--window-size=1920,1080".to_string()],
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::IMAGE_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            file_logging: true,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            json_format: false,
        }
    }
}

/// Base name of the optional configuration file
pub const CONFIG_FILE_STEM: &str = "scan_harvester";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SCAN_HARVESTER";

impl AppConfig {
    /// Load defaults, then the optional config file, then environment overrides
    pub fn load() -> HarvestResult<Self> {
        Self::load_from(CONFIG_FILE_STEM)
    }

    pub fn load_from(file_stem: &str) -> HarvestResult<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_original_run() {
        let config = AppConfig::default();
        assert_eq!(config.collector.page_count, 12);
        assert_eq!(config.collector.max_workers, 6);
        assert_eq!(config.collector.ready_timeout_seconds, 15);
        assert_eq!(config.http.timeout_seconds, 10);
        assert_eq!(config.storage.dataset_path, PathBuf::from("brain_scan_dataset.csv"));
        assert_eq!(config.collector.selectors.entry, ".jg-entry");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[collector]\npage_count = 2\nmax_workers = 3\n\n[storage]\nimage_dir = \"imgs\"").unwrap();

        let stem = dir.path().join("harvest");
        let config = AppConfig::load_from(stem.to_str().unwrap()).unwrap();

        assert_eq!(config.collector.page_count, 2);
        assert_eq!(config.collector.max_workers, 3);
        assert_eq!(config.storage.image_dir, PathBuf::from("imgs"));
        // untouched keys keep their defaults
        assert_eq!(config.collector.results_per_page, 100);
        assert_eq!(config.browser.webdriver_url, "http://localhost:9515");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("does-not-exist");
        let config = AppConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.collector.page_count, defaults::PAGE_COUNT);
    }
}
