use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::io::{read_json, write_json_atomic};

/// Durable aggregation state: the graph so far and the extracts folded into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint<A> {
    pub extracts: Vec<String>,
    pub graph: A,
}

/// Atomically replace the checkpoint at `path`.
pub fn save_checkpoint<A: Serialize>(path: &Path, checkpoint: &Checkpoint<A>) -> Result<()> {
    write_json_atomic(path, checkpoint)
        .with_context(|| format!("[aggregate::checkpoint] Failed to write {}", path.display()))?;
    debug!("[aggregate::checkpoint] saved {} ({} extracts)", path.display(), checkpoint.extracts.len());
    Ok(())
}

/// Load the checkpoint at `path`, or `None` if there is none yet.
pub fn load_checkpoint<A: DeserializeOwned>(path: &Path) -> Result<Option<Checkpoint<A>>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path)
        .map(Some)
        .with_context(|| format!("[aggregate::checkpoint] Failed to restore {}", path.display()))
}
