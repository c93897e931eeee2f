use anyhow::{bail, Result};
use log::info;

use crate::{
    graph::{NodeId, NodeKind, WeightedGraph},
    overlap::OverlapMap,
};

use super::Redistribution;

/// Redistribute a cell-to-category graph onto a block-to-category graph.
///
/// Each edge (c, k, w) adds `w * source_area_percentage(c → X)` to the edge
/// (X, k) for every block X overlapped by cell c. Categories are not spatial,
/// so no edge is walked twice and no halving is applied.
pub fn redistribute_categories(source: &WeightedGraph, overlaps: &OverlapMap) -> Result<Redistribution> {
    let mut out = Redistribution::seeded(overlaps);

    for (key, &weight) in source.edges_sorted() {
        let (cell, category) = match key.endpoints() {
            (a, b) if a.kind() == NodeKind::Cell && b.kind() == NodeKind::Category => (a, b),
            (a, b) if a.kind() == NodeKind::Category && b.kind() == NodeKind::Cell => (b, a),
            (a, b) => bail!("[redistribute::categories] edge {a} - {b} is not a cell-to-category edge"),
        };
        if !out.check_coverage(overlaps, cell) { continue }

        for x in overlaps.targets(cell.id()) {
            out.graph.add_weight(NodeId::block(&x.target), category.clone(), weight * x.source_area_percentage);
        }
    }

    info!("[redistribute] {} cell-category edges (weight {:.3}) -> {} block-category edges (weight {:.3})",
        source.edge_count(), source.total_weight(), out.graph.edge_count(), out.graph.total_weight());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlap::OverlapRecord, region::RegionId};

    fn cell(id: &str) -> NodeId { NodeId::cell(&RegionId::from(id)) }

    fn block(id: &str) -> NodeId { NodeId::block(&RegionId::from(id)) }

    fn sample_map() -> OverlapMap {
        let record = |s: &str, t: &str, sp: f64, tp: f64| OverlapRecord {
            source: s.into(), target: t.into(), source_area_percentage: sp, target_area_percentage: tp,
        };
        OverlapMap::from_records(
            ["1", "2"].map(RegionId::from),
            vec![record("1", "X", 0.6, 0.5), record("1", "Y", 0.4, 0.1), record("2", "X", 1.0, 0.5)],
        )
    }

    #[test]
    fn weight_follows_source_share_without_halving() {
        let mut source = WeightedGraph::new();
        source.add_weight(cell("1"), NodeId::category("39"), 10.0);
        source.add_weight(NodeId::category("39"), cell("2"), 4.0);
        source.add_weight(cell("1"), NodeId::category("44"), 5.0);

        let out = redistribute_categories(&source, &sample_map()).unwrap();
        let it = NodeId::category("39");
        let uk = NodeId::category("44");

        assert!((out.graph.weight(&block("X"), &it).unwrap() - 10.0).abs() < 1e-9);
        assert!((out.graph.weight(&block("Y"), &it).unwrap() - 4.0).abs() < 1e-9);
        assert!((out.graph.weight(&block("X"), &uk).unwrap() - 3.0).abs() < 1e-9);
        assert!((out.graph.weight(&block("Y"), &uk).unwrap() - 2.0).abs() < 1e-9);
        assert!((out.graph.total_weight() - source.total_weight()).abs() < 1e-9);
    }

    #[test]
    fn uncovered_cells_are_reported() {
        let mut source = WeightedGraph::new();
        source.add_weight(cell("9"), NodeId::category("39"), 1.0);

        let out = redistribute_categories(&source, &sample_map()).unwrap();
        assert_eq!(out.graph.edge_count(), 0);
        assert!(!out.graph.contains_node(&NodeId::category("39")));
        assert!(out.uncovered.contains("9"));
    }

    #[test]
    fn cell_to_cell_edges_are_rejected() {
        let mut source = WeightedGraph::new();
        source.add_weight(cell("1"), cell("2"), 1.0);
        assert!(redistribute_categories(&source, &sample_map()).is_err());
    }
}
