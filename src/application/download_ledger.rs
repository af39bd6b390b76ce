//! Which image names may still be downloaded in this run

use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::image_record::ImageName;
use crate::error::{HarvestError, HarvestResult};

/// Outcome of asking for a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the name for this run
    Granted,
    /// Recorded by an earlier run
    AlreadyDownloaded,
    /// Another worker claimed it earlier in this run
    AlreadyClaimed,
}

/// Pre-run snapshot of recorded names plus the names claimed live in this run
///
/// The live set is checked and updated under one lock, so two workers that
/// derive the same name cannot both download it. A claim is never released:
/// a failed download is not retried until the next run.
#[derive(Debug, Default)]
pub struct DownloadLedger {
    downloaded: HashSet<ImageName>,
    claimed: Mutex<HashSet<ImageName>>,
}

impl DownloadLedger {
    pub fn new(downloaded: HashSet<ImageName>) -> Self {
        Self { downloaded, claimed: Mutex::new(HashSet::new()) }
    }

    pub fn try_claim(&self, name: &ImageName) -> HarvestResult<Claim> {
        if self.downloaded.contains(name) {
            return Ok(Claim::AlreadyDownloaded);
        }

        let mut claimed = self.claimed.lock().map_err(|_| HarvestError::LockPoisoned("download ledger"))?;
        if claimed.insert(name.clone()) {
            Ok(Claim::Granted)
        } else {
            Ok(Claim::AlreadyClaimed)
        }
    }

    pub fn previously_downloaded(&self) -> usize {
        self.downloaded.len()
    }
}
