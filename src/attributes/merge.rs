use std::collections::BTreeSet;

use anyhow::{bail, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeId, NodeKind};

use super::{lookup, AttrValue, AttributeTable, Attributes};

/// Census block identifier column.
pub const DEFAULT_ID_FIELD: &str = "SEZ2011";

/// Block nodes for which the attribute table had no record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub missing: BTreeSet<String>,
}

/// Copy each block's record from `table` onto its node. Blocks without a
/// record are left untouched and reported.
pub fn merge_block_attributes<V>(graph: &mut Graph<V>, table: &AttributeTable) -> MergeReport {
    let mut report = MergeReport::default();

    for (node, attrs) in graph.nodes_mut().filter(|(node, _)| node.kind() == NodeKind::Block) {
        match table.get(node.id()) {
            Some(record) => attrs.extend(record.iter().map(|(k, v)| (k.clone(), v.clone()))),
            None => { report.missing.insert(node.id().to_string()); }
        }
    }

    if !report.missing.is_empty() {
        warn!("[attributes] {} blocks have no attribute record", report.missing.len());
    }
    report
}

/// Identifier value for a node: an integer when the id parses as one.
fn id_value(node: &NodeId) -> AttrValue {
    node.id().parse::<i64>()
        .map(AttrValue::Int)
        .unwrap_or_else(|_| AttrValue::Text(node.id().to_string()))
}

/// Normalize every block node to the same key set.
///
/// The canonical keys are those of the first block (in insertion order) that
/// has any attributes, plus `id_field`. Blocks with no attributes get every
/// canonical key as null, then `id_field` is set from the node id wherever it
/// is null or absent. Returns the number of blocks that were filled.
///
/// Fails if any block still differs from the canonical key set.
pub fn fill_holes<V>(graph: &mut Graph<V>, id_field: &str) -> Result<usize> {
    let mut canonical: Vec<String> = graph.nodes_of_kind(NodeKind::Block)
        .find(|(_, attrs)| !attrs.is_empty())
        .map(|(_, attrs)| attrs.keys().cloned().collect())
        .unwrap_or_default();
    if !canonical.iter().any(|key| key == id_field) {
        canonical.push(id_field.to_string());
    }

    let mut filled = 0;
    for (node, attrs) in graph.nodes_mut().filter(|(node, _)| node.kind() == NodeKind::Block) {
        if attrs.is_empty() {
            *attrs = canonical.iter().map(|key| (key.clone(), None)).collect::<Attributes>();
            filled += 1;
        }
        if lookup(attrs, id_field).is_missing() {
            attrs.insert(id_field.to_string(), Some(id_value(node)));
        }
    }

    for (node, attrs) in graph.nodes_of_kind(NodeKind::Block) {
        if attrs.len() != canonical.len() || !canonical.iter().all(|key| attrs.contains_key(key)) {
            let extra = attrs.keys().filter(|key| !canonical.contains(key)).collect::<Vec<_>>();
            let absent = canonical.iter().filter(|key| !attrs.contains_key(*key)).collect::<Vec<_>>();
            bail!("[attributes::fill_holes] {node} has {} keys, expected {} (extra: {extra:?}, absent: {absent:?})",
                attrs.len(), canonical.len());
        }
    }

    debug!("[attributes] filled {filled} blocks with {} null keys", canonical.len());
    Ok(filled)
}

/// Merge attribute records onto block nodes, then fill holes so every block
/// carries the same keys.
pub fn annotate_blocks<V>(graph: &mut Graph<V>, table: &AttributeTable, id_field: &str) -> Result<MergeReport> {
    let report = merge_block_attributes(graph, table);
    let filled = fill_holes(graph, id_field)?;
    info!("[attributes] annotated {} blocks ({} without a record, {filled} filled)",
        graph.nodes_of_kind(NodeKind::Block).count(), report.missing.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::WeightedGraph, region::RegionId};

    fn block(id: &str) -> NodeId { NodeId::block(&RegionId::from(id)) }

    fn record(pairs: &[(&str, Option<AttrValue>)]) -> Attributes {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn sample_table() -> AttributeTable {
        let mut table = AttributeTable::new();
        table.insert("100", record(&[
            ("SEZ2011", Some(AttrValue::Int(100))),
            ("P1", Some(AttrValue::Int(35))),
            ("COMUNE", Some(AttrValue::Text("Milano".into()))),
        ]));
        table.insert("200", record(&[
            ("SEZ2011", None),
            ("P1", Some(AttrValue::Int(12))),
            ("COMUNE", Some(AttrValue::Text("Milano".into()))),
        ]));
        table
    }

    fn sample_graph() -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        graph.add_weight(block("100"), block("300"), 1.0);
        graph.add_node(block("200"));
        graph.add_weight(block("100"), NodeId::category("39"), 2.0);
        graph
    }

    #[test]
    fn merge_reports_blocks_without_records() {
        let mut graph = sample_graph();
        let report = merge_block_attributes(&mut graph, &sample_table());

        assert_eq!(report.missing, BTreeSet::from(["300".to_string()]));
        assert_eq!(graph.attributes(&block("100")).unwrap()["P1"], Some(AttrValue::Int(35)));
        assert!(graph.attributes(&block("300")).unwrap().is_empty());
        assert!(graph.attributes(&NodeId::category("39")).unwrap().is_empty());
    }

    #[test]
    fn annotated_blocks_share_one_key_set() {
        let mut graph = sample_graph();
        annotate_blocks(&mut graph, &sample_table(), DEFAULT_ID_FIELD).unwrap();

        let keys = graph.nodes_of_kind(NodeKind::Block)
            .map(|(_, attrs)| attrs.keys().cloned().collect::<BTreeSet<_>>())
            .collect::<Vec<_>>();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0] == w[1]));

        let hole = graph.attributes(&block("300")).unwrap();
        assert_eq!(hole["P1"], None);
        assert_eq!(hole["SEZ2011"], Some(AttrValue::Int(300)));
        // An explicit null id is replaced as well.
        assert_eq!(graph.attributes(&block("200")).unwrap()["SEZ2011"], Some(AttrValue::Int(200)));
    }

    #[test]
    fn non_integer_ids_stay_text() {
        let mut graph = WeightedGraph::new();
        graph.add_node(block("A7"));
        fill_holes(&mut graph, DEFAULT_ID_FIELD).unwrap();

        let attrs = graph.attributes(&block("A7")).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["SEZ2011"], Some(AttrValue::Text("A7".into())));
    }

    #[test]
    fn mismatched_key_sets_are_rejected() {
        let mut graph = sample_graph();
        let mut table = sample_table();
        table.insert("300", record(&[("SEZ2011", Some(AttrValue::Int(300))), ("OTHER", None)]));

        let err = annotate_blocks(&mut graph, &table, DEFAULT_ID_FIELD).unwrap_err();
        assert!(err.to_string().contains("block:300"), "{err}");
    }
}
