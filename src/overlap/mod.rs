mod compute;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::region::RegionId;

pub use compute::{compute_overlaps, snap_fraction, SNAP_TOLERANCE};

/// One intersecting (source, target) region pair with the share of each
/// region's area covered by the intersection.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRecord {
    pub source: RegionId,
    pub target: RegionId,
    pub source_area_percentage: f64,
    pub target_area_percentage: f64,
}

/// A target region reached from a source region (forward view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetShare {
    pub target: RegionId,
    pub source_area_percentage: f64,
    pub target_area_percentage: f64,
}

/// A source region reached from a target region (inverse view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceShare {
    pub source: RegionId,
    pub source_area_percentage: f64,
    pub target_area_percentage: f64,
}

/// Many-to-many overlap relation between a source and a target partition.
///
/// Every source region known to the mapping has an entry; an empty entry
/// means the region is not covered by any target region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlapMap {
    forward: BTreeMap<RegionId, Vec<TargetShare>>,
}

impl OverlapMap {
    /// Build a mapping from records. Every id in `sources` gets an entry, even
    /// when no record mentions it.
    pub fn from_records(
        sources: impl IntoIterator<Item = RegionId>,
        records: impl IntoIterator<Item = OverlapRecord>,
    ) -> Self {
        let mut forward: BTreeMap<RegionId, Vec<TargetShare>> = sources.into_iter()
            .map(|id| (id, Vec::new()))
            .collect();

        for record in records {
            forward.entry(record.source).or_default().push(TargetShare {
                target: record.target,
                source_area_percentage: record.source_area_percentage,
                target_area_percentage: record.target_area_percentage,
            });
        }

        Self { forward }
    }

    /// Number of source regions with an entry (covered or not).
    #[inline] pub fn source_count(&self) -> usize { self.forward.len() }

    /// Total number of (source, target) records.
    pub fn record_count(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    /// Targets overlapped by `source`. Unknown and uncovered sources both yield an empty slice.
    pub fn targets(&self, source: &str) -> &[TargetShare] {
        self.forward.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over every source region and its targets, ordered by source id.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &[TargetShare])> {
        self.forward.iter().map(|(id, shares)| (id, shares.as_slice()))
    }

    /// Source regions with at least one target.
    pub fn covered(&self) -> impl Iterator<Item = &RegionId> {
        self.forward.iter().filter(|(_, shares)| !shares.is_empty()).map(|(id, _)| id)
    }

    /// Source regions with no target.
    pub fn uncovered(&self) -> impl Iterator<Item = &RegionId> {
        self.forward.iter().filter(|(_, shares)| shares.is_empty()).map(|(id, _)| id)
    }

    /// Every target region reached by some source region.
    pub fn target_ids(&self) -> BTreeSet<RegionId> {
        self.forward.values()
            .flat_map(|shares| shares.iter().map(|share| share.target.clone()))
            .collect()
    }

    /// Flatten into records, ordered by source id.
    pub fn records(&self) -> impl Iterator<Item = OverlapRecord> + '_ {
        self.forward.iter().flat_map(|(source, shares)| {
            shares.iter().map(move |share| OverlapRecord {
                source: source.clone(),
                target: share.target.clone(),
                source_area_percentage: share.source_area_percentage,
                target_area_percentage: share.target_area_percentage,
            })
        })
    }

    /// Derive the target → sources view. Uncovered sources do not appear.
    pub fn inverse(&self) -> BTreeMap<RegionId, Vec<SourceShare>> {
        let mut inverse: BTreeMap<RegionId, Vec<SourceShare>> = BTreeMap::new();
        for record in self.records() {
            inverse.entry(record.target).or_default().push(SourceShare {
                source: record.source,
                source_area_percentage: record.source_area_percentage,
                target_area_percentage: record.target_area_percentage,
            });
        }
        inverse
    }
}
