//! Error types shared by the collector and the reporter
//!
//! Every failure carries enough context (URL, status, selector) to be
//! diagnosed from a single log line.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Browser session error: {0}")]
    Browser(String),

    #[error("Page load failed for {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("Timed out after {seconds}s waiting for result entries on {url}")]
    ReadyTimeout { url: String, seconds: u64 },

    #[error("Entry {index} has no image element")]
    MissingImage { index: usize },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolution { url: String, reason: String },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("Dataset file not found: {}", .0.display())]
    DatasetMissing(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl HarvestError {
    /// Whether the run can carry on past this failure (skip the page or entry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DatasetMissing(_) | Self::Config(_) | Self::InvalidSelector { .. } => false,
            Self::LockPoisoned(_) => false,
            Self::Browser(_)
            | Self::PageLoad { .. }
            | Self::ReadyTimeout { .. }
            | Self::MissingImage { .. }
            | Self::UrlResolution { .. }
            | Self::HttpStatus { .. }
            | Self::Network(_)
            | Self::Io(_)
            | Self::Dataset(_)
            | Self::Chart(_) => true,
        }
    }
}

pub type HarvestResult<T> = Result<T, HarvestError>;
