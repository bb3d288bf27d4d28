//! Path naming utilities for metadata files

use crate::defaults::BACKUP_SUFFIX;
use crate::remote::LayerKind;
use std::path::{Path, PathBuf};

/// Characters that are illegal in Windows or Unix file names.
pub const ILLEGAL_PATH_CHARS: [char; 10] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*', ','];

/// Remove illegal path characters from a layer title
///
/// Only the characters in [`ILLEGAL_PATH_CHARS`] are removed; everything else,
/// including whitespace, is left untouched.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !ILLEGAL_PATH_CHARS.contains(c))
        .collect()
}

/// File name a layer's metadata document is saved under:
/// `{kind}_{id}_{sanitized title}.iso.xml`
pub fn metadata_file_name(kind: LayerKind, id: u64, title: &str) -> String {
    format!("{}_{}_{}.iso.xml", kind, id, sanitize_title(title))
}

/// Backup location for a metadata file
pub fn backup_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
