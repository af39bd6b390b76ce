//! Application layer: the collection run and the dataset report
//!
//! Wires the infrastructure pieces together; binaries only load configuration
//! and call into here.

pub mod collector;
pub mod download_ledger;
pub mod reporter;

pub use collector::{CollectionStats, Collector, EntryOutcome, EntryWorker};
pub use download_ledger::{Claim, DownloadLedger};
pub use reporter::{DatasetSummary, run_report};
