//! Logging system configuration and initialization
//!
//! - Console output is always on
//! - Optional file output (plain text or JSON lines) through a non-blocking writer
//! - A log file left over from a previous run is renamed with its timestamp
//! - `RUST_LOG` overrides the configured filter

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{HarvestError, HarvestResult};
pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive until the process exits
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Dependency targets that are only interesting at trace level
const NOISY_TARGETS: [&str; 7] = ["reqwest", "hyper", "hyper_util", "h2", "fantoccini", "html5ever", "selectors"];

/// Build the filter: `RUST_LOG` if set, else the configured level with noisy crates quietened
fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(level);
        if !level.to_lowercase().contains("trace") {
            for target in NOISY_TARGETS {
                if let Ok(directive) = format!("{target}=warn").parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
        filter
    })
}

/// Rename `<name>.log` to `<name>.<timestamp>.log` if it exists
fn rotate_existing_log_file(log_dir: &Path, file_name: &str) -> HarvestResult<()> {
    let path = log_dir.join(file_name);
    if !path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&path)?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamp: DateTime<Local> = file_time.into();

    let stem = file_name.trim_end_matches(".log");
    let rotated = log_dir.join(format!("{stem}.{}.log", stamp.format("%Y%m%dT%H%M%S")));
    std::fs::rename(&path, &rotated)?;
    Ok(())
}

/// Initialize logging for one binary; `app_name` names the log file
pub fn init_logging(config: &LoggingConfig, app_name: &str) -> HarvestResult<()> {
    let console_layer = fmt::layer().with_target(false).boxed();

    let file_layer = if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_name = format!("{app_name}.log");
        rotate_existing_log_file(&config.log_dir, &file_name)?;

        let appender = rolling::never(&config.log_dir, &file_name);
        let (writer, guard) = non_blocking(appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| HarvestError::LockPoisoned("log guards"))?
            .push(guard);

        let layer = fmt::layer().with_writer(writer).with_ansi(false).with_thread_ids(true);
        Some(if config.json_format { layer.json().boxed() } else { layer.boxed() })
    } else {
        None
    };

    Registry::default()
        .with(build_env_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HarvestError::Io(std::io::Error::other(e.to_string())))?;

    info!(
        level = %config.level,
        file_logging = config.file_logging,
        log_dir = %config.log_dir.display(),
        "Logging initialized"
    );
    Ok(())
}

/// Console-only logging for tests and quick runs; ignores repeated calls
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_test_writer()
        .try_init();
}
