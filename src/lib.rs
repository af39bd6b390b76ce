//! Scan Harvester - Brain scan image collector and dataset reporter
//!
//! Two independent stages share one CSV dataset:
//! - the collector renders paginated image-search listings in a browser,
//!   downloads every matched image and appends one row per image;
//! - the reporter reads the dataset back and prints descriptive statistics
//!   plus a bar chart of the most frequent scan types.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod error;

pub use error::{HarvestError, HarvestResult};
