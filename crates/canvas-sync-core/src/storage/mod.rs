//! Disk side of a transfer: write to a temp file, then rename into place.
//!
//! Nothing ever appears under a final name until the whole body has been
//! written. On any failure the temp file is removed.

mod writer;

pub use writer::StorageWriter;

use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".temp";

/// Path for the temp file: appends `.temp` to the final path (e.g. `a.pdf` → `a.pdf.temp`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
