use anyhow::Result;
use cellgraph::{compute_overlaps, read_partition, write_json_atomic, Settings};
use log::info;

use super::write_artifact;
use crate::cli::OverlapArgs;

pub fn run(settings: &Settings, args: &OverlapArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./overlaps.json".into());
    let cell_ids = args.cell_ids.clone().unwrap_or_else(|| settings.source_ids.clone());
    let block_ids = args.block_ids.clone().unwrap_or_else(|| settings.target_ids.clone());

    info!("[overlap] loading cells from {} ({cell_ids})", args.cells.display());
    let cells = read_partition(&args.cells, &cell_ids)?;
    info!("[overlap] loading blocks from {} ({block_ids})", args.blocks.display());
    let blocks = read_partition(&args.blocks, &block_ids)?;

    info!("[overlap] intersecting {} cells with {} blocks", cells.len(), blocks.len());
    let map = compute_overlaps(&cells, &blocks, settings.snap_tolerance);

    info!("[overlap] writing overlap map to {}", out_path.display());
    write_json_atomic(&out_path, &map)?;

    let inverse = map.inverse();
    write_artifact(&out_path, "inverse", &inverse, inverse.len())?;

    let uncovered = map.uncovered().collect::<Vec<_>>();
    write_artifact(&out_path, "uncovered", &uncovered, uncovered.len())
}
