use anyhow::{Context, Result};
use cellgraph::{
    read_json, redistribute_blocks, redistribute_categories, write_json_atomic, OverlapMap, Settings, TallyGraph,
    WeightedGraph,
};
use log::info;

use super::write_artifact;
use crate::cli::{RedistributeArgs, Topology};

pub fn run(_settings: &Settings, args: &RedistributeArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./blocks.json".into());
    let overlaps: OverlapMap = read_json(&args.overlaps)?;

    info!("[redistribute] loading cell graph from {}", args.graph.display());
    let result = match args.topology {
        Topology::Blocks => {
            let cells: WeightedGraph = read_json(&args.graph)
                .context("[redistribute] expected a cell-pair graph")?;
            redistribute_blocks(&cells, &overlaps)?
        }
        Topology::Categories => {
            let tallies: TallyGraph = read_json(&args.graph)
                .context("[redistribute] expected a cell-category graph")?;
            info!("[redistribute] weighting edges by {:?}", args.channel);
            redistribute_categories(&tallies.to_weighted(args.channel), &overlaps)?
        }
    };

    info!("[redistribute] writing block graph to {}", out_path.display());
    write_json_atomic(&out_path, &result.graph)?;
    write_artifact(&out_path, "uncovered", &result.uncovered, result.uncovered.len())
}
