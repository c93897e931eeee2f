use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("[io::fs] Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("[io::fs] Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Parent directory of `target`, with a bare file name resolving to `.`.
fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write-then-rename wrapper: readers of `target` never observe a partial file.
pub struct PendingWrite {
    target: PathBuf,
    tmp: BufWriter<NamedTempFile>,
}

impl PendingWrite {
    /// Open a temp file next to `target`, creating parent directories as needed.
    pub fn open(target: &Path) -> Result<Self> {
        let dir = parent_dir(target);
        ensure_dir_exists(dir)?;
        let tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("[io::fs] create temp file in {}", dir.display()))?;
        Ok(Self { target: target.to_path_buf(), tmp: BufWriter::new(tmp) })
    }

    /// Flush, fsync and move the temp file over `target`.
    pub fn commit(self) -> Result<()> {
        let tmp = self.tmp.into_inner()
            .map_err(|e| anyhow::anyhow!("[io::fs] flush {}: {}", self.target.display(), e.error()))?;
        tmp.as_file().sync_all().ok(); // best-effort
        tmp.persist(&self.target)
            .with_context(|| format!("[io::fs] rename to {}", self.target.display()))?;
        let _ = File::open(parent_dir(&self.target)).and_then(|f| f.sync_all());
        Ok(())
    }
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

/// Serialize `value` as JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut pending = PendingWrite::open(path)?;
    serde_json::to_writer(&mut pending, value)
        .with_context(|| format!("[io::fs] serialize {}", path.display()))?;
    pending.commit()
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("[io::fs] open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::fs] parse JSON {}", path.display()))
}
