use std::path::Path;

use anyhow::Result;
use cellgraph::{
    annotate_blocks, annotate_categories, read_attribute_csv, read_attribute_dir, read_json, write_json_atomic,
    AttributeTable, CategoryNames, Settings, WeightedGraph,
};
use log::info;

use super::write_artifact;
use crate::cli::AnnotateArgs;

/// JSON table, directory of CSV files, or a single CSV file.
fn load_table(path: &Path, id_field: &str) -> Result<AttributeTable> {
    if path.is_dir() {
        read_attribute_dir(path, id_field)
    } else if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
        read_json(path)
    } else {
        read_attribute_csv(path, id_field)
    }
}

pub fn run(settings: &Settings, args: &AnnotateArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| args.graph.clone());
    let mut graph: WeightedGraph = read_json(&args.graph)?;

    info!("[annotate] loading attributes from {}", args.attributes.display());
    let table = load_table(&args.attributes, &settings.block_id_field)?;
    let report = annotate_blocks(&mut graph, &table, &settings.block_id_field)?;

    if let Some(names_path) = &args.names {
        let names: CategoryNames = read_json(names_path)?;
        let missing = annotate_categories(&mut graph, &names);
        write_artifact(&out_path, "missing_names", &missing, missing.len())?;
    }

    info!("[annotate] writing annotated graph to {}", out_path.display());
    write_json_atomic(&out_path, &graph)?;
    write_artifact(&out_path, "missing_blocks", &report.missing, report.missing.len())
}
