//! Before/after snapshots of transformed pages for debugging.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File stem for the snapshots of `page`: extension dropped, path separators
/// replaced by `_`.
pub fn snapshot_stem(page: &str) -> String {
    let stem = page
        .strip_suffix(".md")
        .or_else(|| page.strip_suffix(".html"))
        .unwrap_or(page);
    stem.trim_start_matches(['/', '\\']).replace(['/', '\\'], "_")
}

/// Write `<stem>_before.html` and `<stem>_after.html` under `dir`, creating
/// it if needed. Returns the two paths written.
pub fn write_snapshots(
    dir: &Path,
    page: &str,
    before: &str,
    after: &str,
) -> io::Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;
    let stem = snapshot_stem(page);
    let before_path = dir.join(format!("{stem}_before.html"));
    let after_path = dir.join(format!("{stem}_after.html"));
    fs::write(&before_path, before)?;
    fs::write(&after_path, after)?;
    Ok((before_path, after_path))
}
