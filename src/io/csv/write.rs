//! CSV writing operations.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter, NamedFrom}, series::Series};

use crate::{
    attributes::AttrValue,
    graph::{NodeKind, WeightedGraph},
    io::fs::PendingWrite,
};

/// Write a DataFrame to a CSV file, atomically.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut pending = PendingWrite::open(path)?;
    CsvWriter::new(&mut pending)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))?;
    pending.commit()
}

/// One typed column from the values of a single attribute key.
fn attribute_column(name: &str, values: Vec<Option<&AttrValue>>) -> Column {
    if values.iter().flatten().all(|v| matches!(v, AttrValue::Int(_))) {
        let ints = values.iter()
            .map(|v| v.and_then(|v| match v { AttrValue::Int(n) => Some(*n), _ => None }))
            .collect::<Vec<_>>();
        return Series::new(name.into(), ints).into();
    }
    if values.iter().flatten().all(|v| matches!(v, AttrValue::Int(_) | AttrValue::Float(_))) {
        let floats = values.iter()
            .map(|v| v.and_then(|v| match v {
                AttrValue::Int(n) => Some(*n as f64),
                AttrValue::Float(x) => Some(*x),
                AttrValue::Text(_) => None,
            }))
            .collect::<Vec<_>>();
        return Series::new(name.into(), floats).into();
    }
    let text = values.iter().map(|v| v.map(|v| v.to_string())).collect::<Vec<_>>();
    Series::new(name.into(), text).into()
}

/// Tabular view of the nodes of one kind: a `node` id column, one column per
/// attribute key (first-seen order), and an `edges` column listing every
/// `(neighbor, weight)` pair of the node. The `node` column holds bare ids;
/// neighbors keep their kind prefix, since blocks and categories can share
/// an id: `[(block:2, 2.5), (category:39, 4)]`.
pub fn node_table(graph: &WeightedGraph, kind: NodeKind) -> Result<DataFrame> {
    let nodes = graph.nodes_of_kind(kind).collect::<Vec<_>>();
    let keys = nodes.iter()
        .flat_map(|(_, attrs)| attrs.keys().map(String::as_str))
        .collect::<IndexSet<_>>();
    let adjacency = graph.neighbors();

    let mut columns: Vec<Column> = Vec::with_capacity(keys.len() + 2);
    let ids = nodes.iter().map(|(node, _)| node.id().to_string()).collect::<Vec<_>>();
    columns.push(Series::new("node".into(), ids).into());

    for key in &keys {
        let values = nodes.iter()
            .map(|(_, attrs)| attrs.get(*key).and_then(Option::as_ref))
            .collect::<Vec<_>>();
        columns.push(attribute_column(key, values));
    }

    let edges = nodes.iter()
        .map(|(node, _)| {
            let pairs = adjacency.get(node).map(|list| {
                list.iter().map(|(other, w)| format!("({other}, {w})")).collect::<Vec<_>>().join(", ")
            });
            format!("[{}]", pairs.unwrap_or_default())
        })
        .collect::<Vec<_>>();
    columns.push(Series::new("edges".into(), edges).into());

    DataFrame::new(columns).context("[io::csv::write] Failed to build node table")
}

/// Write the block table and, if the graph has category nodes, the category
/// table. Returns the paths written.
pub fn write_node_tables(graph: &WeightedGraph, dir: &Path, stem: &str) -> Result<Vec<std::path::PathBuf>> {
    let mut written = Vec::new();
    for (kind, suffix) in [(NodeKind::Block, "blocks"), (NodeKind::Category, "categories")] {
        if kind == NodeKind::Category && graph.nodes_of_kind(kind).next().is_none() { continue }

        let path = dir.join(format!("{stem}_{suffix}.csv"));
        let mut df = node_table(graph, kind)?;
        write_csv(&mut df, &path)?;
        written.push(path);
    }
    Ok(written)
}
