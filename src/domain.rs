//! Domain layer: image records, scan-type vocabulary and listing pagination
//!
//! Pure types and functions without I/O.

pub mod image_record;
pub mod page_window;
pub mod scan_type;

pub use image_record::{ImageName, ImageRecord};
pub use page_window::PageWindow;
pub use scan_type::{SCAN_TYPE_VOCABULARY, detect_scan_types};
