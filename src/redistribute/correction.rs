use crate::graph::WeightedGraph;

/// Halve every edge weight.
///
/// Block-to-block accumulation visits each source edge once from each
/// endpoint, so every contribution lands on the target graph twice. Apply
/// exactly once, after all contributions are summed.
pub fn correct_double_counting(graph: &mut WeightedGraph) {
    graph.edge_values_mut().for_each(|w| *w /= 2.0);
}
