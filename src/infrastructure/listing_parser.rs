//! Listing page parser
//!
//! Turns a rendered result grid into owned [`ListingEntry`] values so the
//! per-entry work can run on other tasks without touching the DOM.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{HarvestError, HarvestResult};
use crate::infrastructure::config::ListingSelectors;

/// One result tile as found on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Position within the page, 0-based
    pub index: usize,
    /// Raw `src` of the nested image, if there is one
    pub image_src: Option<String>,
    /// Trimmed caption text; `None` when the caption element is missing
    pub caption: Option<String>,
    /// Trimmed secondary caption; `None` when the element is missing
    pub bottom_line: Option<String>,
}

impl ListingEntry {
    /// Absolute image URL, resolving relative sources against `base_url`
    pub fn image_url(&self, base_url: &str) -> HarvestResult<String> {
        let src = self
            .image_src
            .as_deref()
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .ok_or(HarvestError::MissingImage { index: self.index })?;
        resolve_url(src, base_url)
    }
}

/// Resolve `href` against `base_url` unless it is already absolute
pub fn resolve_url(href: &str, base_url: &str) -> HarvestResult<String> {
    if let Ok(absolute) = Url::parse(href) {
        return Ok(absolute.into());
    }

    let base = Url::parse(base_url).map_err(|e| HarvestError::UrlResolution {
        url: base_url.to_string(),
        reason: format!("Invalid base URL: {e}"),
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|e| HarvestError::UrlResolution {
            url: href.to_string(),
            reason: format!("Failed to join with {base_url}: {e}"),
        })
}

/// Compiled selectors for the result grid
pub struct ListingParser {
    entry: Selector,
    image: Selector,
    caption: Selector,
    bottom_line: Selector,
}

impl ListingParser {
    pub fn new(selectors: &ListingSelectors) -> HarvestResult<Self> {
        Ok(Self {
            entry: compile_selector(&selectors.entry)?,
            image: compile_selector(&selectors.image)?,
            caption: compile_selector(&selectors.caption)?,
            bottom_line: compile_selector(&selectors.bottom_line)?,
        })
    }

    /// Every result entry in document order
    pub fn parse_entries(&self, html: &str) -> Vec<ListingEntry> {
        let document = Html::parse_document(html);
        let entries: Vec<ListingEntry> = document
            .select(&self.entry)
            .enumerate()
            .map(|(index, element)| ListingEntry {
                index,
                image_src: element
                    .select(&self.image)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(ToString::to_string),
                caption: inner_text(element, &self.caption),
                bottom_line: inner_text(element, &self.bottom_line),
            })
            .collect();

        debug!(count = entries.len(), "Parsed listing entries");
        entries
    }
}

fn compile_selector(selector: &str) -> HarvestResult<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text of the first match under `element`; present-but-empty yields `Some("")`
fn inner_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| found.text().collect::<String>().trim().to_string())
}
