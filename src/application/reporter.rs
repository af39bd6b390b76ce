//! Reporter: descriptive statistics over the collected dataset
//!
//! Reads the whole dataset, prints a short summary and draws the scan-type
//! frequency chart. The chart is skipped when no record carries a tag.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::image_record::ImageRecord;
use crate::error::HarvestResult;
use crate::infrastructure::chart::{BarChartSpec, ChartRenderer};
use crate::infrastructure::dataset::load_records;

pub const SUMMARY_TOP_TYPES: usize = 5;
pub const CHART_TOP_TYPES: usize = 10;

/// Aggregates over every record of the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub total_records: usize,
    /// Mean caption length over records with a non-blank caption, 0.0 when there are none
    pub average_description_length: f64,
    /// Tag counts, highest first; equal counts keep first-seen order
    pub scan_type_frequencies: Vec<(String, usize)>,
    /// Distinct non-blank secondary captions
    pub distinct_bottom_lines: usize,
}

impl DatasetSummary {
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let lengths: Vec<usize> = records.iter().filter_map(ImageRecord::description_len).collect();
        let average_description_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut first_seen: Vec<&str> = Vec::new();
        for tag in records.iter().flat_map(|record| record.scan_types.iter()) {
            let count = counts.entry(tag.as_str()).or_insert_with(|| {
                first_seen.push(tag.as_str());
                0
            });
            *count += 1;
        }
        let mut scan_type_frequencies: Vec<(String, usize)> = first_seen
            .into_iter()
            .map(|tag| (tag.to_string(), counts[tag]))
            .collect();
        // stable sort keeps first-seen order among ties
        scan_type_frequencies.sort_by(|a, b| b.1.cmp(&a.1));

        let distinct_bottom_lines = records
            .iter()
            .filter_map(|record| record.bottom_line.as_deref())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_records: records.len(),
            average_description_length,
            scan_type_frequencies,
            distinct_bottom_lines,
        }
    }

    pub fn top_scan_types(&self, n: usize) -> &[(String, usize)] {
        &self.scan_type_frequencies[..n.min(self.scan_type_frequencies.len())]
    }

    pub fn frequency_of(&self, scan_type: &str) -> usize {
        self.scan_type_frequencies
            .iter()
            .find(|(tag, _)| tag == scan_type)
            .map_or(0, |(_, count)| *count)
    }

    /// Print the summary lines
    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        let top = self
            .top_scan_types(SUMMARY_TOP_TYPES)
            .iter()
            .map(|(tag, count)| format!("{tag} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(out)?;
        writeln!(out, "📊 Total Images: {}", self.total_records)?;
        writeln!(out, "✍️ Average Description Length: {:.2} characters", self.average_description_length)?;
        writeln!(out, "🔍 Top {SUMMARY_TOP_TYPES} Scan Types: [{top}]")?;
        writeln!(out, "📝 Unique Bottom Lines: {}", self.distinct_bottom_lines)?;
        Ok(())
    }
}

pub fn scan_type_chart_spec() -> BarChartSpec {
    BarChartSpec {
        title: format!("Top {CHART_TOP_TYPES} Scan Types"),
        x_label: "Scan Type".to_string(),
        y_label: "Frequency".to_string(),
    }
}

/// Print the summary and draw the chart; returns whether a chart was drawn
pub fn present_summary(
    summary: &DatasetSummary,
    chart: &impl ChartRenderer,
    out: &mut impl Write,
) -> HarvestResult<bool> {
    summary.write_to(out)?;

    if summary.scan_type_frequencies.is_empty() {
        warn!("No scan type data to plot");
        writeln!(out, "⚠️ No scan type data to plot.")?;
        return Ok(false);
    }

    chart.render_bar_chart(&scan_type_chart_spec(), summary.top_scan_types(CHART_TOP_TYPES))?;
    Ok(true)
}

/// Load `dataset_path`, then summarize, print and chart it
pub fn run_report(
    dataset_path: impl AsRef<Path>,
    chart: &impl ChartRenderer,
    out: &mut impl Write,
) -> HarvestResult<DatasetSummary> {
    let dataset_path = dataset_path.as_ref();
    let records = load_records(dataset_path)?;
    info!(records = records.len(), path = %dataset_path.display(), "Dataset loaded");

    let summary = DatasetSummary::from_records(&records);
    present_summary(&summary, chart, out)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image_record::ImageName;
    use proptest::prelude::*;
    use rstest::rstest;

    fn record(tags: &[&str], description: Option<&str>, bottom_line: Option<&str>) -> ImageRecord {
        ImageRecord {
            image_name: ImageName::from("image0001.png".to_string()),
            scan_types: tags.iter().map(ToString::to_string).collect(),
            description: description.map(ToString::to_string),
            bottom_line: bottom_line.map(ToString::to_string),
            image_url: "https://openi.nlm.nih.gov/imgs/1.png".to_string(),
        }
    }

    #[test]
    fn average_ignores_empty_descriptions() {
        let records = [
            record(&[], Some("abcde"), None),
            record(&[], Some("abcdefghij"), None),
            record(&[], Some(""), None),
        ];
        let summary = DatasetSummary::from_records(&records);
        assert!((summary.average_description_length - 7.5).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case::no_records(vec![])]
    #[case::only_blank(vec![record(&[], Some("  "), None), record(&[], None, None)])]
    fn average_is_zero_without_descriptions(#[case] records: Vec<ImageRecord>) {
        assert_eq!(DatasetSummary::from_records(&records).average_description_length, 0.0);
    }

    #[test]
    fn every_tag_of_every_record_counts_once() {
        let summary = DatasetSummary::from_records(&[record(&["CT", "MRI"], None, None), record(&["CT"], None, None)]);
        assert_eq!(summary.frequency_of("CT"), 2);
        assert_eq!(summary.frequency_of("MRI"), 1);
        assert_eq!(summary.scan_type_frequencies, vec![("CT".to_string(), 2), ("MRI".to_string(), 1)]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let summary = DatasetSummary::from_records(&[
            record(&["PET", "MRI"], None, None),
            record(&["CT"], None, None),
            record(&["CT"], None, None),
        ]);
        let order: Vec<&str> = summary.scan_type_frequencies.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, vec!["CT", "PET", "MRI"]);
    }

    #[test]
    fn top_lists_are_truncated() {
        let tags = ["CT", "MRI", "PET", "X-ray", "Video", "Graphics", "Microscopy"];
        let records: Vec<ImageRecord> = tags.iter().map(|t| record(&[*t], None, None)).collect();
        let summary = DatasetSummary::from_records(&records);
        assert_eq!(summary.top_scan_types(SUMMARY_TOP_TYPES).len(), 5);
        assert_eq!(summary.top_scan_types(CHART_TOP_TYPES).len(), 7);
    }

    #[test]
    fn distinct_bottom_lines_skip_blank_values() {
        let summary = DatasetSummary::from_records(&[
            record(&[], None, Some("Mass noted")),
            record(&[], None, Some("Mass noted")),
            record(&[], None, Some("   ")),
            record(&[], None, None),
            record(&[], None, Some("Midline shift")),
        ]);
        assert_eq!(summary.distinct_bottom_lines, 2);
    }

    #[test]
    fn summary_lines_are_printed() {
        let summary = DatasetSummary::from_records(&[
            record(&["CT", "MRI"], Some("abcde"), Some("Mass noted")),
            record(&["CT"], Some("abcdefghij"), None),
        ]);
        let mut out = Vec::new();
        summary.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total Images: 2"));
        assert!(text.contains("Average Description Length: 7.50 characters"));
        assert!(text.contains("Top 5 Scan Types: [CT (2), MRI (1)]"));
        assert!(text.contains("Unique Bottom Lines: 1"));
    }

    proptest! {
        #[test]
        fn frequencies_account_for_every_tag(
            tag_lists in proptest::collection::vec(
                proptest::collection::vec(proptest::sample::select(vec!["CT", "MRI", "PET", "MR"]), 0..4),
                0..20,
            )
        ) {
            let records: Vec<ImageRecord> = tag_lists.iter().map(|tags| record(tags, None, None)).collect();
            let summary = DatasetSummary::from_records(&records);

            let total_tags: usize = tag_lists.iter().map(Vec::len).sum();
            let counted: usize = summary.scan_type_frequencies.iter().map(|(_, c)| c).sum();
            prop_assert_eq!(counted, total_tags);
            prop_assert!(summary.scan_type_frequencies.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }
}
