use std::path::{Path, PathBuf};

use anyhow::Result;
use cellgraph::{
    discover_extracts, read_json, write_json_atomic, Accumulate, Aggregator, OverlapMap, Settings, TallyGraph,
    Universe, WeightedGraph,
};
use log::info;

use crate::cli::{AggregateArgs, ExtractKind};

pub fn run(_settings: &Settings, args: &AggregateArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./cells.json".into());

    let extracts = if args.input.is_dir() {
        discover_extracts(&args.input)?
    } else {
        vec![args.input.clone()]
    };
    info!("[aggregate] {} extracts under {}", extracts.len(), args.input.display());

    let universe = match &args.overlaps {
        Some(path) => Universe::from_overlaps(&read_json::<OverlapMap>(path)?),
        None => Universe::unrestricted(),
    };
    if let Some(cells) = universe.cells() {
        info!("[aggregate] restricting to {} covered cells", cells.len());
    }

    match args.kind {
        ExtractKind::Pairs => aggregate::<WeightedGraph>(universe, &extracts, args.checkpoint.clone(), &out_path),
        ExtractKind::Categories => aggregate::<TallyGraph>(universe, &extracts, args.checkpoint.clone(), &out_path),
    }
}

fn aggregate<A: Accumulate>(universe: Universe, extracts: &[PathBuf], checkpoint: Option<PathBuf>, out_path: &Path) -> Result<()> {
    let mut aggregator = match checkpoint {
        Some(path) => Aggregator::<A>::resume(universe, path)?,
        None => Aggregator::<A>::new(universe, None),
    };
    aggregator.run(extracts)?;
    let graph = aggregator.finish();

    info!("[aggregate] writing graph to {}", out_path.display());
    write_json_atomic(out_path, &graph)
}
