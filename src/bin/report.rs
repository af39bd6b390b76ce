//! Reporter entry point
//!
//! Prints dataset statistics and writes the scan-type chart. Exits with
//! status 1 when the dataset file does not exist.

use anyhow::{Context, Result};

use scan_harvester::HarvestError;
use scan_harvester::application::run_report;
use scan_harvester::infrastructure::{AppConfig, BarChartPng, init_logging};

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging, "report").context("Failed to initialize logging")?;

    let chart = BarChartPng::new(&config.storage.chart_path);
    let mut stdout = std::io::stdout().lock();

    match run_report(&config.storage.dataset_path, &chart, &mut stdout) {
        Ok(_) => Ok(()),
        Err(HarvestError::DatasetMissing(path)) => {
            eprintln!("❌ CSV file not found: {}", path.display());
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Report failed"),
    }
}
