use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable file name of a downloaded image: `image{NNNN}.png`
///
/// The sequence number is `page * results_per_page + index + 1`, so the
/// first entry of the first page is `image0001.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageName(String);

impl ImageName {
    pub fn for_entry(page: u32, index: usize, results_per_page: u32) -> Self {
        let sequence = u64::from(page) * u64::from(results_per_page) + index as u64 + 1;
        Self(format!("image{sequence:04}.png"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ImageName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One downloaded image and the metadata scraped next to it
///
/// Absent captions are `None` here; the placeholder text only exists in the
/// dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub image_name: ImageName,
    pub scan_types: Vec<String>,
    pub description: Option<String>,
    pub bottom_line: Option<String>,
    pub image_url: String,
}

impl ImageRecord {
    /// Caption length in characters, `None` when the caption is absent or blank
    pub fn description_len(&self) -> Option<usize> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| text.chars().count())
    }
}
