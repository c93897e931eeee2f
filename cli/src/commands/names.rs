use std::collections::BTreeSet;

use anyhow::Result;
use cellgraph::{calling_code_names, read_json, write_json_atomic, Graph, NodeKind, Settings};
use indexmap::IndexMap;
use log::info;

use crate::cli::NamesArgs;

pub fn run(_settings: &Settings, args: &NamesArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./category_names.json".into());

    // Edge payloads differ between pair and tally graphs; only node ids matter here.
    let mut codes = BTreeSet::new();
    for path in &args.graphs {
        let graph: Graph<serde_json::Value> = read_json(path)?;
        codes.extend(graph.nodes_of_kind(NodeKind::Category).map(|(node, _)| node.id().to_string()));
    }

    let countries: IndexMap<String, String> = read_json(&args.countries)?;
    let phones: IndexMap<String, String> = read_json(&args.phones)?;
    let names = calling_code_names(codes.iter().map(String::as_str), &countries, &phones);

    let unnamed = names.iter().filter(|(_, name)| name.is_none()).count();
    info!("[names] {} codes, {unnamed} without a name; writing {}", names.len(), out_path.display());
    write_json_atomic(&out_path, &names)
}
