use std::path::PathBuf;

use anyhow::Result;
use cellgraph::{ensure_dir_exists, read_json, write_node_tables, Settings, WeightedGraph};
use log::info;

use crate::cli::ExportArgs;

pub fn run(_settings: &Settings, args: &ExportArgs) -> Result<()> {
    let out_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
    ensure_dir_exists(&out_dir)?;

    let graph: WeightedGraph = read_json(&args.graph)?;
    let stem = args.graph.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "graph".into());

    for path in write_node_tables(&graph, &out_dir, &stem)? {
        info!("[export] wrote {}", path.display());
    }
    Ok(())
}
