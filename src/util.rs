use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// `YYYYmmdd_HHMMSS` in UTC, used in default output file names.
pub fn timestamp_slug() -> String {
    let fmt = match time::format_description::parse("[year][month][day]_[hour][minute][second]") {
        Ok(fmt) => fmt,
        Err(_) => return "19700101_000000".to_string(),
    };
    time::OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "19700101_000000".to_string())
}

/// Strips `.csv.gz`, `.gz` or `.csv` from a file name.
pub fn table_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".csv.gz", ".gz", ".csv"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(name)
}

/// Sibling path `<stem><suffix>` next to `path`.
pub fn sibling_with(path: &Path, suffix: &str) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}{}", table_stem(path), suffix))
}
