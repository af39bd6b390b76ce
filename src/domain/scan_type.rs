//! Scan-type vocabulary and caption tagging

/// Imaging modalities looked for in every caption, in reporting order
pub const SCAN_TYPE_VOCABULARY: [&str; 14] = [
    "CT",
    "MRI",
    "X-ray",
    "Ultrasound",
    "PET",
    "Microscopy",
    "Graphics",
    "Photographs",
    "Video",
    "Tomography",
    "Magnetic resonance",
    "FDG-PET",
    "MR",
    "computed-tomography",
];

/// Separator used when several tags share one dataset field
pub const TAG_SEPARATOR: &str = ", ";

/// Every vocabulary entry contained in `caption`, ignoring case
///
/// Matching is plain substring search, so "MR" also fires on "MRI".
pub fn detect_scan_types(caption: &str) -> Vec<&'static str> {
    let haystack = caption.to_lowercase();
    SCAN_TYPE_VOCABULARY
        .iter()
        .copied()
        .filter(|scan_type| haystack.contains(&scan_type.to_lowercase()))
        .collect()
}

pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(TAG_SEPARATOR)
}

/// Split a stored tag field back into trimmed, non-empty tags
pub fn split_tags(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}
