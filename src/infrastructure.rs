//! Infrastructure layer for browser rendering, HTTP, storage and output
//!
//! This module provides the WebDriver session, listing parsing, image
//! downloads, the CSV dataset, chart rendering, configuration and logging.

pub mod browser;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod http_client;
pub mod listing_parser;
pub mod logging;

// Re-export commonly used items
pub use browser::{PageRenderer, WebDriverSession};
pub use chart::{BarChartPng, BarChartSpec, ChartRenderer};
pub use config::AppConfig;
pub use dataset::{DatasetWriter, load_downloaded_names, load_records};
pub use http_client::ImageFetcher;
pub use listing_parser::{ListingEntry, ListingParser};
pub use logging::{init_console_logging, init_logging};
