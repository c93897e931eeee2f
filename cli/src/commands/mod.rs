pub mod aggregate;
pub mod annotate;
pub mod assign;
pub mod export;
pub mod names;
pub mod overlap;
pub mod redistribute;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;
use serde::Serialize;

/// `dir/stem_suffix.json` next to `output`.
pub(crate) fn artifact_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "output".into());
    output.with_file_name(format!("{stem}_{suffix}.json"))
}

/// Write an anomaly report next to `output` and log where it went.
pub(crate) fn write_artifact<T: Serialize + ?Sized>(output: &Path, suffix: &str, value: &T, count: usize) -> Result<()> {
    let path = artifact_path(output, suffix);
    cellgraph::write_json_atomic(&path, value)?;
    info!("[{suffix}] {count} entries written to {}", path.display());
    Ok(())
}
