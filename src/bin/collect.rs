//! Collector entry point
//!
//! Needs a running WebDriver endpoint (e.g. `chromedriver --port=9515`).
//! Ctrl-C stops after the page currently being processed.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scan_harvester::application::{Collector, EntryWorker};
use scan_harvester::infrastructure::{AppConfig, WebDriverSession, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging, "collect").context("Failed to initialize logging")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, finishing current page");
            ctrl_c.cancel();
        }
    });

    let worker = EntryWorker::from_config(&config).context("Failed to prepare downloads")?;
    let session = WebDriverSession::connect(&config.browser)
        .await
        .context("Failed to start browser session")?;

    let stats = Collector::new(session, worker, config.collector.clone())?
        .with_cancellation(cancel)
        .run()
        .await;

    println!("\n🎉 Scraping complete! Metadata saved in {}", config.storage.dataset_path.display());
    println!("   ✅ Downloaded: {}", stats.downloaded);
    println!("   ⏭️ Skipped (already downloaded): {}", stats.already_downloaded + stats.already_claimed);
    println!("   ⚠️ Failed: {}", stats.failed);
    println!("   📄 Pages rendered / skipped: {} / {}", stats.pages_rendered, stats.pages_skipped);
    if stats.halted {
        println!("   🛑 Stopped early after an unrecoverable error (see log)");
    }

    info!("Collector finished");
    Ok(())
}
