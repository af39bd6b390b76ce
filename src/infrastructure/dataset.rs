//! CSV dataset shared by the collector (writer) and the reporter (reader)
//!
//! Records carry `Option`s and an empty tag list; rows carry placeholder text.
//! On read, only blank cells and the bottom-line placeholder become absent.
//! `Unknown` stays a countable tag and `No description` a regular caption.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::image_record::{ImageName, ImageRecord};
use crate::domain::scan_type::{join_tags, split_tags};
use crate::error::{HarvestError, HarvestResult};

pub const HEADER: [&str; 5] = ["Image Name", "Scan Type(s)", "Description", "Bottom Line", "Image URL"];

pub const NO_DESCRIPTION: &str = "No description";
pub const NO_BOTTOM_LINE: &str = "No bottom line";
pub const UNKNOWN_SCAN_TYPE: &str = "Unknown";

/// One dataset row exactly as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(rename = "Image Name")]
    pub image_name: String,
    #[serde(rename = "Scan Type(s)")]
    pub scan_types: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Bottom Line")]
    pub bottom_line: String,
    #[serde(rename = "Image URL")]
    pub image_url: String,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `None` for blank values and for the placeholder (case-insensitive)
fn present(value: &str, placeholder: &str) -> Option<String> {
    non_blank(value).filter(|text| !text.eq_ignore_ascii_case(placeholder))
}

impl From<&ImageRecord> for DatasetRow {
    fn from(record: &ImageRecord) -> Self {
        Self {
            image_name: record.image_name.to_string(),
            scan_types: if record.scan_types.is_empty() {
                UNKNOWN_SCAN_TYPE.to_string()
            } else {
                join_tags(&record.scan_types)
            },
            description: record.description.clone().unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            bottom_line: record.bottom_line.clone().unwrap_or_else(|| NO_BOTTOM_LINE.to_string()),
            image_url: record.image_url.clone(),
        }
    }
}

impl From<DatasetRow> for ImageRecord {
    fn from(row: DatasetRow) -> Self {
        Self {
            image_name: ImageName::from(row.image_name),
            scan_types: split_tags(&row.scan_types),
            description: non_blank(&row.description),
            bottom_line: present(&row.bottom_line, NO_BOTTOM_LINE),
            image_url: row.image_url,
        }
    }
}

/// Append-only dataset writer
///
/// The header is written once, only when the file is new or empty. Appends
/// are serialized by a mutex and flushed row by row so an abrupt stop keeps
/// every completed record.
pub struct DatasetWriter {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl DatasetWriter {
    pub fn open(path: impl AsRef<Path>) -> HarvestResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let needs_header = std::fs::metadata(&path).map_or(true, |meta| meta.len() == 0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
            writer.flush()?;
            info!(path = %path.display(), "Created dataset with header");
        }

        Ok(Self { path, writer: Mutex::new(writer) })
    }

    /// Append one record and flush it to disk
    pub fn append(&self, record: &ImageRecord) -> HarvestResult<()> {
        let row = DatasetRow::from(record);
        let mut writer = self.writer.lock().map_err(|_| HarvestError::LockPoisoned("dataset writer"))?;
        writer.serialize(&row)?;
        writer.flush()?;
        debug!(image = %row.image_name, "Appended dataset row");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
impl DatasetWriter {
    /// Poison the writer lock by panicking while holding it
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = self.writer.lock();
                    panic!("writer lock poisoned on purpose");
                })
                .join()
        });
    }
}

/// Names already recorded by earlier runs; empty when the file does not exist
pub fn load_downloaded_names(path: impl AsRef<Path>) -> HarvestResult<HashSet<ImageName>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut names = HashSet::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                if let Some(name) = record.get(0).map(str::trim).filter(|name| !name.is_empty()) {
                    names.insert(ImageName::from(name.to_string()));
                }
            }
            Err(e) => warn!(error = %e, "Skipping unreadable dataset row"),
        }
    }

    info!(count = names.len(), path = %path.display(), "Loaded previously downloaded names");
    Ok(names)
}

/// Read every record; malformed rows are logged and skipped
pub fn load_records(path: impl AsRef<Path>) -> HarvestResult<Vec<ImageRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HarvestError::DatasetMissing(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<DatasetRow>().enumerate() {
        match result {
            Ok(row) => records.push(ImageRecord::from(row)),
            Err(e) => warn!(row = line + 1, error = %e, "Skipping malformed dataset row"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::task::JoinSet;

    fn record(index: usize, tags: &[&str], description: Option<&str>, bottom_line: Option<&str>) -> ImageRecord {
        ImageRecord {
            image_name: ImageName::for_entry(0, index, 100),
            scan_types: tags.iter().map(ToString::to_string).collect(),
            description: description.map(ToString::to_string),
            bottom_line: bottom_line.map(ToString::to_string),
            image_url: format!("https://openi.nlm.nih.gov/imgs/{index}.png"),
        }
    }

    #[test]
    fn absent_fields_become_placeholders_in_rows() {
        let row = DatasetRow::from(&record(0, &[], None, None));
        assert_eq!(row.scan_types, "Unknown");
        assert_eq!(row.description, "No description");
        assert_eq!(row.bottom_line, "No bottom line");
    }

    #[test]
    fn only_bottom_line_placeholder_reads_back_as_absent() {
        let row = DatasetRow {
            image_name: "image0001.png".into(),
            scan_types: "Unknown".into(),
            description: "No description".into(),
            bottom_line: "NO BOTTOM LINE".into(),
            image_url: "u".into(),
        };
        let record = ImageRecord::from(row);
        assert_eq!(record.scan_types, vec!["Unknown".to_string()]);
        assert_eq!(record.description.as_deref(), Some("No description"));
        assert_eq!(record.description_len(), Some(14));
        assert_eq!(record.bottom_line, None);
    }

    #[test]
    fn blank_cells_read_back_as_absent() {
        let row = DatasetRow {
            image_name: "image0002.png".into(),
            scan_types: " ".into(),
            description: "".into(),
            bottom_line: "  ".into(),
            image_url: "u".into(),
        };
        let record = ImageRecord::from(row);
        assert!(record.scan_types.is_empty());
        assert_eq!(record.description, None);
        assert_eq!(record.bottom_line, None);
    }

    #[test]
    fn header_written_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");

        let writer = DatasetWriter::open(&path).unwrap();
        writer.append(&record(0, &["CT"], Some("Axial CT"), None)).unwrap();
        drop(writer);

        let writer = DatasetWriter::open(&path).unwrap();
        writer.append(&record(1, &["CT", "MRI"], Some("CT, then MRI"), Some("Mass"))).unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Image Name,Scan Type(s),Description,Bottom Line,Image URL");
        assert_eq!(lines[1], "image0001.png,CT,Axial CT,No bottom line,https://openi.nlm.nih.gov/imgs/0.png");
        assert_eq!(lines[2], "image0002.png,\"CT, MRI\",\"CT, then MRI\",Mass,https://openi.nlm.nih.gov/imgs/1.png");
    }

    #[test]
    fn empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        std::fs::write(&path, "").unwrap();

        DatasetWriter::open(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn records_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.csv");
        let original = record(4, &["PET"], Some("PET, \"quoted\" caption"), Some("Mass noted"));

        DatasetWriter::open(&path).unwrap().append(&original).unwrap();

        assert_eq!(load_records(&path).unwrap(), vec![original.clone()]);
        let names = load_downloaded_names(&path).unwrap();
        assert!(names.contains(&original.image_name));
        assert_eq!(names.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_rows_whole() {
        const WRITERS: usize = 64;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        let writer = Arc::new(DatasetWriter::open(&path).unwrap());

        let caption = |i: usize| format!("Axial CT, slice {i}, \"contrast\", {}end", "left, right, ".repeat(40));
        let mut tasks = JoinSet::new();
        for i in 0..WRITERS {
            let writer = Arc::clone(&writer);
            let text = caption(i);
            tasks.spawn(async move {
                writer.append(&record(i, &["CT", "MRI"], Some(&text), Some("Mass, left"))).unwrap();
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        let mut records = load_records(&path).unwrap();
        assert_eq!(records.len(), WRITERS);
        records.sort_by(|a, b| a.image_name.as_str().cmp(b.image_name.as_str()));
        for (i, loaded) in records.iter().enumerate() {
            assert_eq!(loaded, &record(i, &["CT", "MRI"], Some(&caption(i)), Some("Mass, left")));
        }
    }

    #[test]
    fn missing_dataset_has_no_names_but_cannot_be_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(load_downloaded_names(&path).unwrap().is_empty());
        assert!(matches!(load_records(&path), Err(HarvestError::DatasetMissing(_))));
    }
}
