use std::collections::{BTreeMap, BTreeSet};

use geo::Point;
use log::info;
use serde::Serialize;

use crate::region::{Partition, RegionId};

/// Items grouped by containing region. Regions without items are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment<T> {
    pub regions: BTreeMap<RegionId, Vec<T>>,
    pub unassigned: Vec<T>,
}

impl<T> Default for Assignment<T> {
    fn default() -> Self {
        Self { regions: BTreeMap::new(), unassigned: Vec::new() }
    }
}

/// Put each item into the region containing its point. When regions share a
/// boundary, the lowest-indexed containing region wins.
pub fn assign_points<T>(
    partition: &Partition,
    items: impl IntoIterator<Item = T>,
    point_of: impl Fn(&T) -> Point<f64>,
) -> Assignment<T> {
    let mut out = Assignment::default();
    for item in items {
        match partition.locate(&point_of(&item)) {
            Some(idx) => out.regions.entry(partition.id(idx).clone()).or_default().push(item),
            None => out.unassigned.push(item),
        }
    }
    info!("[assign] {} regions with items, {} items unassigned", out.regions.len(), out.unassigned.len());
    out
}

impl<T> Assignment<T> {
    /// Number of distinct keys per region, e.g. unique users.
    pub fn distinct_counts<K: Ord>(&self, key_of: impl Fn(&T) -> Option<K>) -> BTreeMap<RegionId, usize> {
        self.regions.iter()
            .map(|(id, items)| (id.clone(), items.iter().filter_map(&key_of).collect::<BTreeSet<_>>().len()))
            .collect()
    }
}

/// Mean of the per-region counts; `None` when there are no regions.
pub fn mean_count(counts: &BTreeMap<RegionId, usize>) -> Option<f64> {
    (!counts.is_empty()).then(|| counts.values().sum::<usize>() as f64 / counts.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    fn square(id: &str, x: f64, y: f64) -> Region {
        Region::from_ring(id, &[(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0), (x, y)])
    }

    #[test]
    fn points_land_in_their_region() {
        let partition = Partition::new(vec![square("a", 0.0, 0.0), square("b", 1.0, 0.0), square("c", 5.0, 5.0)]).unwrap();
        let items = vec![("u1", 0.5, 0.5), ("u2", 1.5, 0.5), ("u1", 0.2, 0.8), ("u3", 9.0, 9.0)];

        let out = assign_points(&partition, items, |(_, x, y)| Point::new(*x, *y));
        assert_eq!(out.regions.len(), 2);
        assert_eq!(out.regions[&RegionId::from("a")].len(), 2);
        assert!(!out.regions.contains_key("c"));
        assert_eq!(out.unassigned.len(), 1);

        let users = out.distinct_counts(|(user, _, _)| Some(*user));
        assert_eq!(users[&RegionId::from("a")], 1);
        assert_eq!(mean_count(&users), Some(1.0));
        assert_eq!(mean_count(&BTreeMap::new()), None);
    }
}
