use anyhow::{bail, Result};
use log::info;

use crate::{
    graph::{NodeId, NodeKind, WeightedGraph},
    overlap::OverlapMap,
};

use super::{correct_double_counting, Redistribution};

/// Project a cell-to-cell graph onto blocks without the final halving.
///
/// Every source edge (u, v, w) is walked from both endpoints. From `u`
/// toward `v`, each overlap `u → X` and `v → Y` adds
/// `w * source_area_percentage(u → X) * target_area_percentage(v → Y)` to the
/// block edge (X, Y). A self-loop is walked twice as well.
pub fn accumulate_block_contributions(source: &WeightedGraph, overlaps: &OverlapMap) -> Result<Redistribution> {
    let mut out = Redistribution::seeded(overlaps);

    for (key, &weight) in source.edges_sorted() {
        let (a, b) = key.endpoints();
        if a.kind() != NodeKind::Cell || b.kind() != NodeKind::Cell {
            bail!("[redistribute::blocks] edge {a} - {b} is not a cell-to-cell edge");
        }

        for (from, to) in [(a, b), (b, a)] {
            let from_covered = out.check_coverage(overlaps, from);
            let to_covered = out.check_coverage(overlaps, to);
            if !from_covered || !to_covered { continue }

            for x in overlaps.targets(from.id()) {
                for y in overlaps.targets(to.id()) {
                    let contribution = weight * x.source_area_percentage * y.target_area_percentage;
                    out.graph.add_weight(NodeId::block(&x.target), NodeId::block(&y.target), contribution);
                }
            }
        }
    }

    Ok(out)
}

/// Redistribute a cell-to-cell graph onto a block-to-block graph.
pub fn redistribute_blocks(source: &WeightedGraph, overlaps: &OverlapMap) -> Result<Redistribution> {
    let mut out = accumulate_block_contributions(source, overlaps)?;
    correct_double_counting(&mut out.graph);

    info!("[redistribute] {} cell edges (weight {:.3}) -> {} block edges (weight {:.3}) over {} blocks",
        source.edge_count(), source.total_weight(),
        out.graph.edge_count(), out.graph.total_weight(), out.graph.node_count());
    Ok(out)
}
