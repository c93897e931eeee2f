mod checkpoint;
mod extract;

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::RecordError,
    graph::{NodeId, TallyGraph, WeightedGraph},
    overlap::OverlapMap,
    region::RegionId,
};

pub use checkpoint::{load_checkpoint, save_checkpoint, Checkpoint};
pub use extract::{discover_extracts, open_extract, read_extract, CategoryRecord, PairRecord};

/// The cells an aggregation keeps. Records touching any other cell are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Universe {
    cells: Option<BTreeSet<RegionId>>,
}

impl Universe {
    /// Keep every cell.
    pub fn unrestricted() -> Self { Self { cells: None } }

    /// Keep the cells with at least one overlapping target region.
    pub fn from_overlaps(overlaps: &OverlapMap) -> Self {
        Self { cells: Some(overlaps.covered().cloned().collect()) }
    }

    #[inline]
    pub fn contains(&self, cell: &RegionId) -> bool {
        self.cells.as_ref().is_none_or(|cells| cells.contains(cell))
    }

    /// The explicit cell set, if restricted.
    pub fn cells(&self) -> Option<&BTreeSet<RegionId>> { self.cells.as_ref() }
}

/// A graph that can be built from extract lines.
pub trait Accumulate: Default + Serialize + DeserializeOwned {
    type Record;

    fn parse(line: &str) -> Result<Self::Record, RecordError>;

    /// Whether the record survives the universe filter.
    fn admits(universe: &Universe, record: &Self::Record) -> bool;

    fn absorb(&mut self, record: Self::Record);

    /// Add a delta into the accumulated graph.
    fn merge(&mut self, delta: Self);

    /// Prepare an empty graph before the first extract.
    fn seed(&mut self, _universe: &Universe) {}
}

impl Accumulate for WeightedGraph {
    type Record = PairRecord;

    fn parse(line: &str) -> Result<PairRecord, RecordError> { PairRecord::parse(line) }

    fn admits(universe: &Universe, record: &PairRecord) -> bool {
        universe.contains(&record.cell1) && universe.contains(&record.cell2)
    }

    fn absorb(&mut self, record: PairRecord) {
        self.add_weight(NodeId::cell(&record.cell1), NodeId::cell(&record.cell2), record.strength);
    }

    fn merge(&mut self, delta: Self) { WeightedGraph::merge(self, delta) }

    /// Every universe cell is a node, connected or not.
    fn seed(&mut self, universe: &Universe) {
        for cell in universe.cells().into_iter().flatten() {
            self.add_node(NodeId::cell(cell));
        }
    }
}

impl Accumulate for TallyGraph {
    type Record = CategoryRecord;

    fn parse(line: &str) -> Result<CategoryRecord, RecordError> { CategoryRecord::parse(line) }

    fn admits(universe: &Universe, record: &CategoryRecord) -> bool {
        universe.contains(&record.cell)
    }

    fn absorb(&mut self, record: CategoryRecord) {
        self.edge_entry(NodeId::cell(&record.cell), NodeId::category(&record.code))
            .record(&record.activity);
    }

    fn merge(&mut self, delta: Self) { TallyGraph::merge(self, delta) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Accumulating,
    Checkpointed,
    Done,
}

/// Line counts for one processed extract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub records: usize,
    pub admitted: usize,
    pub filtered: usize,
}

/// Streams extracts one at a time into a graph, checkpointing after each.
pub struct Aggregator<A> {
    graph: A,
    universe: Universe,
    checkpoint: Option<PathBuf>,
    extracts: Vec<String>,
    stage: Stage,
}

impl<A: Accumulate> Aggregator<A> {
    /// Start from an empty graph. With a checkpoint path, the state is saved
    /// there after every extract.
    pub fn new(universe: Universe, checkpoint: Option<PathBuf>) -> Self {
        let mut graph = A::default();
        graph.seed(&universe);
        Self { graph, universe, checkpoint, extracts: Vec::new(), stage: Stage::Idle }
    }

    /// Continue from the checkpoint at `path` if one exists, otherwise start fresh.
    pub fn resume(universe: Universe, path: PathBuf) -> Result<Self> {
        match load_checkpoint::<A>(&path)? {
            Some(Checkpoint { extracts, graph }) => {
                info!("[aggregate] resuming from {} after {} extracts", path.display(), extracts.len());
                Ok(Self { graph, universe, checkpoint: Some(path), extracts, stage: Stage::Checkpointed })
            }
            None => Ok(Self::new(universe, Some(path))),
        }
    }

    #[inline] pub fn stage(&self) -> Stage { self.stage }

    #[inline] pub fn graph(&self) -> &A { &self.graph }

    /// Extracts folded in so far, in processing order.
    #[inline] pub fn extracts(&self) -> &[String] { &self.extracts }

    /// Checkpoint key of an extract: its canonical path, so that differently
    /// spelled paths to one file share a key.
    fn key(path: &Path) -> String {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()).display().to_string()
    }

    /// Whether `path` is already part of the accumulated graph.
    pub fn has_processed(&self, path: &Path) -> bool {
        self.extracts.contains(&Self::key(path))
    }

    /// Fold one extract into the graph. The extract is parsed into its own
    /// delta first, so a malformed line leaves the graph as it was.
    pub fn process(&mut self, path: &Path) -> Result<ExtractSummary> {
        if self.stage == Stage::Done {
            bail!("[aggregate] aggregation already finished");
        }
        let previous = self.stage;
        self.stage = Stage::Accumulating;

        let mut delta = A::default();
        let mut summary = ExtractSummary::default();
        let universe = &self.universe;
        let parsed = read_extract(path, A::parse, |record| {
            if A::admits(universe, &record) {
                delta.absorb(record);
                summary.admitted += 1;
            } else {
                summary.filtered += 1;
            }
        });
        summary.records = match parsed {
            Ok(n) => n,
            Err(e) => {
                self.stage = previous;
                return Err(e);
            }
        };

        self.graph.merge(delta);
        self.extracts.push(Self::key(path));
        info!("[aggregate] {}: {} records, {} kept, {} filtered",
            path.display(), summary.records, summary.admitted, summary.filtered);

        if let Some(checkpoint) = &self.checkpoint {
            let snapshot = Checkpoint { extracts: self.extracts.clone(), graph: &self.graph };
            save_checkpoint(checkpoint, &snapshot)?;
            self.stage = Stage::Checkpointed;
        }
        Ok(summary)
    }

    /// Process every extract not already folded in, in order.
    pub fn run(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            if self.has_processed(path) {
                debug!("[aggregate] skipping {}: already in checkpoint", path.display());
                continue;
            }
            self.process(path)?;
        }
        Ok(())
    }

    /// End the aggregation and hand back the graph.
    pub fn finish(mut self) -> A {
        self.stage = Stage::Done;
        info!("[aggregate] done after {} extracts", self.extracts.len());
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::overlap::OverlapRecord;

    fn cell(id: &str) -> NodeId { NodeId::cell(&RegionId::from(id)) }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn universe() -> Universe {
        let record = |s: &str| OverlapRecord {
            source: s.into(), target: "X".into(), source_area_percentage: 1.0, target_area_percentage: 0.5,
        };
        let map = OverlapMap::from_records(
            ["1", "2", "3", "4"].map(RegionId::from),
            vec![record("1"), record("2"), record("3")],
        );
        Universe::from_overlaps(&map)
    }

    #[test]
    fn universe_filters_uncovered_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "day1.txt", "0\t1\t2\t1.5\n0\t2\t1\t0.5\n0\t1\t4\t9.0\n0\t3\t3\t0.25\n");

        let mut agg = Aggregator::<WeightedGraph>::new(universe(), None);
        let summary = agg.process(&path).unwrap();
        assert_eq!(summary, ExtractSummary { records: 4, admitted: 3, filtered: 1 });
        assert_eq!(agg.stage(), Stage::Accumulating);

        let graph = agg.finish();
        assert_eq!(graph.weight(&cell("1"), &cell("2")), Some(2.0));
        assert_eq!(graph.weight(&cell("3"), &cell("3")), Some(0.25));
        assert!(!graph.contains_node(&cell("4")));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn failed_extract_leaves_graph_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "a.txt", "0\t1\t2\t1.5\n");
        let bad = write(dir.path(), "b.txt", "0\t1\t2\t1.5\n0\t1\tx\t1.0\n");

        let mut agg = Aggregator::<WeightedGraph>::new(Universe::unrestricted(), None);
        agg.process(&good).unwrap();
        let before = agg.graph().clone();

        assert!(agg.process(&bad).is_err());
        assert_eq!(agg.graph(), &before);
        assert_eq!(agg.extracts().len(), 1);
    }

    #[test]
    fn tally_extracts_accumulate_per_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "cc.txt", "1\tt\t39\t\t\t2.0\t\t1.0\n1\tt\t39\t\t\t4.0\t\t0.5\n4\tt\t39\t1\t1\t1\t1\t1\n");

        let mut agg = Aggregator::<TallyGraph>::new(universe(), None);
        agg.process(&path).unwrap();
        let graph = agg.finish();

        let tally = graph.edge(&cell("1"), &NodeId::category("39")).unwrap();
        assert_eq!(tally.call_in.count, 2);
        assert_eq!(tally.weight(crate::graph::Channel::Call), 3.0);
        assert_eq!(tally.internet, 1.5);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn finished_aggregator_rejects_more_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.txt", "0\t1\t2\t1.5\n");
        let mut agg = Aggregator::<WeightedGraph>::new(Universe::unrestricted(), None);
        agg.stage = Stage::Done;
        assert!(agg.process(&path).is_err());
    }
}
