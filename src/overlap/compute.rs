use geo::{Area, BooleanOps, BoundingRect};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::region::Partition;

use super::{OverlapMap, OverlapRecord};

/// Fractions this close to 0 or 1 are treated as float error and snapped.
pub const SNAP_TOLERANCE: f64 = 1e-4;

/// Snap a fraction to 0 or 1 when it lies within `tol` of either bound.
#[inline]
pub fn snap_fraction(value: f64, tol: f64) -> f64 {
    if value < tol { 0.0 } else if value > 1.0 - tol { 1.0 } else { value }
}

/// Compute every overlapping (source, target) pair between two partitions.
///
/// Target candidates come from the target partition's R-tree, so only pairs
/// with intersecting bounding boxes are clipped. The intersection area is
/// computed once per pair and both fractions derive from it, each snapped
/// independently. Source regions are processed in parallel and gathered in
/// index order, so the result does not depend on scheduling.
pub fn compute_overlaps(sources: &Partition, targets: &Partition, tol: f64) -> OverlapMap {
    let per_source = (0..sources.len())
        .into_par_iter()
        .map(|i| overlaps_of(sources, i, targets, tol))
        .collect::<Vec<_>>();

    let map = OverlapMap::from_records(sources.ids().iter().cloned(), per_source.into_iter().flatten());

    let uncovered = map.uncovered().count();
    info!("[overlap] {} records across {} source regions", map.record_count(), map.source_count());
    if uncovered > 0 {
        warn!("[overlap] {uncovered} source regions are not covered by any target region");
    }
    map
}

/// Overlap records for the source region at `idx`, ordered by target index.
fn overlaps_of(sources: &Partition, idx: usize, targets: &Partition, tol: f64) -> Vec<OverlapRecord> {
    let shape = sources.shape(idx);
    let Some(rect) = shape.bounding_rect() else { return Vec::new() };

    let records = targets.candidates(&rect).into_iter()
        .filter_map(|j| {
            let area = shape.intersection(targets.shape(j)).unsigned_area();
            // Shared edges clip to nothing; only interior overlap counts.
            (area > 0.0).then(|| OverlapRecord {
                source: sources.id(idx).clone(),
                target: targets.id(j).clone(),
                source_area_percentage: snap_fraction(area / sources.area(idx), tol),
                target_area_percentage: snap_fraction(area / targets.area(j), tol),
            })
        })
        .collect::<Vec<_>>();

    debug!("[overlap] source {} overlaps {} targets", sources.id(idx), records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Region, RegionId};

    fn rect(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::from_ring(id, &[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
    }

    #[test]
    fn snapping_absorbs_float_error_at_both_bounds() {
        assert_eq!(snap_fraction(0.00005, SNAP_TOLERANCE), 0.0);
        assert_eq!(snap_fraction(0.99995, SNAP_TOLERANCE), 1.0);
        assert_eq!(snap_fraction(0.5, SNAP_TOLERANCE), 0.5);
        assert_eq!(snap_fraction(0.0001, SNAP_TOLERANCE), 0.0001);
    }

    #[test]
    fn split_cell_yields_proportional_fractions() {
        // One 10x1 cell split 60/40 between two blocks of area 12 and 8.
        let cells = Partition::new(vec![rect("c", 0.0, 0.0, 10.0, 1.0)]).unwrap();
        let blocks = Partition::new(vec![
            rect("X", 0.0, -0.5, 6.0, 1.5),
            rect("Y", 6.0, -0.5, 10.0, 1.5),
        ]).unwrap();

        let map = compute_overlaps(&cells, &blocks, SNAP_TOLERANCE);
        let shares = map.targets("c");
        assert_eq!(shares.len(), 2);

        assert_eq!(shares[0].target.as_str(), "X");
        assert!((shares[0].source_area_percentage - 0.6).abs() < 1e-9);
        assert!((shares[0].target_area_percentage - 0.5).abs() < 1e-9);
        assert_eq!(shares[1].target.as_str(), "Y");
        assert!((shares[1].source_area_percentage - 0.4).abs() < 1e-9);
        assert!((shares[1].target_area_percentage - 0.5).abs() < 1e-9);
    }

    #[test]
    fn percentages_agree_on_intersection_area() {
        let cells = Partition::new(vec![
            rect("a", 0.0, 0.0, 3.0, 3.0),
            rect("b", 3.0, 0.0, 5.0, 3.0),
        ]).unwrap();
        let blocks = Partition::new(vec![
            rect("X", 1.0, 1.0, 4.0, 2.0),
            rect("Y", 2.0, 2.0, 6.0, 7.0),
        ]).unwrap();

        let map = compute_overlaps(&cells, &blocks, SNAP_TOLERANCE);
        assert!(map.record_count() > 0);

        for record in map.records() {
            assert!((0.0..=1.0).contains(&record.source_area_percentage));
            assert!((0.0..=1.0).contains(&record.target_area_percentage));

            let s = cells.position(record.source.as_str()).unwrap();
            let t = blocks.position(record.target.as_str()).unwrap();
            let from_source = record.source_area_percentage * cells.area(s);
            let from_target = record.target_area_percentage * blocks.area(t);
            assert!((from_source - from_target).abs() < 1e-6, "{record:?}");
        }
    }

    #[test]
    fn touching_regions_do_not_overlap() {
        let cells = Partition::new(vec![rect("a", 0.0, 0.0, 1.0, 1.0)]).unwrap();
        let blocks = Partition::new(vec![rect("X", 1.0, 0.0, 2.0, 1.0)]).unwrap();

        let map = compute_overlaps(&cells, &blocks, SNAP_TOLERANCE);
        assert_eq!(map.record_count(), 0);
        assert_eq!(map.uncovered().collect::<Vec<_>>(), vec![&RegionId::from("a")]);
    }

    #[test]
    fn contained_cell_is_fully_covered() {
        let cells = Partition::new(vec![rect("a", 1.0, 1.0, 2.0, 2.0)]).unwrap();
        let blocks = Partition::new(vec![rect("X", 0.0, 0.0, 10.0, 10.0)]).unwrap();

        let map = compute_overlaps(&cells, &blocks, SNAP_TOLERANCE);
        let shares = map.targets("a");
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].source_area_percentage, 1.0);
        assert!((shares[0].target_area_percentage - 0.01).abs() < 1e-9);
    }
}
