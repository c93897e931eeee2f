mod blocks;
mod categories;
mod correction;

use std::collections::BTreeSet;

use log::warn;
use serde::Serialize;

use crate::{
    graph::{NodeId, WeightedGraph},
    overlap::OverlapMap,
    region::RegionId,
};

pub use blocks::{accumulate_block_contributions, redistribute_blocks};
pub use categories::redistribute_categories;
pub use correction::correct_double_counting;

/// Output of a redistribution: the target graph plus the source cells whose
/// weight was dropped for lack of any overlapping target region.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Redistribution {
    pub graph: WeightedGraph,
    pub uncovered: BTreeSet<RegionId>,
}

impl Redistribution {
    /// Start a target graph with every target region of `overlaps` registered
    /// as a block node, isolated or not.
    fn seeded(overlaps: &OverlapMap) -> Self {
        let mut graph = WeightedGraph::new();
        for target in overlaps.target_ids() {
            graph.add_node(NodeId::block(&target));
        }
        Self { graph, uncovered: BTreeSet::new() }
    }

    /// Record `cell` as uncovered if it has no overlap.
    fn check_coverage(&mut self, overlaps: &OverlapMap, cell: &NodeId) -> bool {
        let covered = !overlaps.targets(cell.id()).is_empty();
        if !covered && self.uncovered.insert(cell.region()) {
            warn!("[redistribute] cell {} has no overlapping block; its weight is dropped", cell.id());
        }
        covered
    }
}
