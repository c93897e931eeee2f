use ahash::AHashMap;
use anyhow::{anyhow, bail, Result};
use geo::{Area, BoundingRect, Contains, Point, Polygon, Rect};
use rstar::{RTree, AABB};

use super::{bbox::{envelope_of, BoundingBox}, Region, RegionId};

/// Partition represents a collection of non-overlapping simple polygons,
/// addressable both by identifier and by location.
#[derive(Debug, Clone)]
pub struct Partition {
    ids: Vec<RegionId>,
    shapes: Vec<Polygon<f64>>,
    areas: Vec<f64>,
    index: AHashMap<RegionId, usize>, // Map between region ids and contiguous indices.
    rtree: RTree<BoundingBox>,
}

impl Partition {
    /// Construct a Partition from a list of regions. Region order determines indices.
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut ids = Vec::with_capacity(regions.len());
        let mut shapes = Vec::with_capacity(regions.len());
        let mut index = AHashMap::with_capacity(regions.len());

        for region in regions {
            if index.insert(region.id.clone(), ids.len()).is_some() {
                bail!("[region::partition] Duplicate region id: {}", region.id);
            }
            ids.push(region.id);
            shapes.push(region.polygon);
        }

        let boxes = shapes.iter().enumerate()
            .map(|(i, shape)| {
                shape.bounding_rect()
                    .map(|bbox| BoundingBox::new(i, bbox))
                    .ok_or_else(|| anyhow!("[region::partition] Region {} has an empty polygon", ids[i]))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            areas: shapes.iter().map(|shape| shape.unsigned_area()).collect(),
            rtree: RTree::bulk_load(boxes),
            ids,
            shapes,
            index,
        })
    }

    /// Get the number of regions.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if there are no regions.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Get the identifier of the region at `idx`.
    #[inline] pub fn id(&self, idx: usize) -> &RegionId { &self.ids[idx] }

    /// Get all identifiers, in index order.
    #[inline] pub fn ids(&self) -> &[RegionId] { &self.ids }

    /// Get the polygon of the region at `idx`.
    #[inline] pub fn shape(&self, idx: usize) -> &Polygon<f64> { &self.shapes[idx] }

    /// Get the planar area of the region at `idx`, in squared coordinate units.
    #[inline] pub fn area(&self, idx: usize) -> f64 { self.areas[idx] }

    /// Look up the index of a region by identifier.
    #[inline] pub fn position(&self, id: &str) -> Option<usize> { self.index.get(id).copied() }

    /// Indices of regions whose bounding boxes intersect `rect`, in ascending order.
    pub fn candidates(&self, rect: &Rect<f64>) -> Vec<usize> {
        let mut found = self.query(&envelope_of(rect)).collect::<Vec<_>>();
        found.sort_unstable();
        found
    }

    /// Find the region containing `point`, if any. Points on a shared boundary
    /// are not contained by either side.
    pub fn locate(&self, point: &Point<f64>) -> Option<usize> {
        let env = AABB::from_corners([point.x(), point.y()], [point.x(), point.y()]);
        let mut found = self.query(&env).collect::<Vec<_>>();
        found.sort_unstable();
        found.into_iter().find(|&j| self.shapes[j].contains(point))
    }

    /// Query the R-tree for region indices whose bounding boxes intersect the envelope.
    #[inline]
    fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree.locate_in_envelope_intersecting(envelope).map(|bb| bb.idx())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str, x: f64, y: f64, size: f64) -> Region {
        Region::from_ring(id, &[(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)])
    }

    #[test]
    fn partition_indexes_regions_in_order() {
        let partition = Partition::new(vec![square("a", 0.0, 0.0, 1.0), square("b", 1.0, 0.0, 1.0)]).unwrap();

        assert_eq!(partition.len(), 2);
        assert_eq!(partition.id(0).as_str(), "a");
        assert_eq!(partition.position("b"), Some(1));
        assert_eq!(partition.position("c"), None);
        assert!((partition.area(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Partition::new(vec![square("a", 0.0, 0.0, 1.0), square("a", 1.0, 0.0, 1.0)]).unwrap_err();
        assert!(err.to_string().contains("Duplicate region id"));
    }

    #[test]
    fn candidates_are_bbox_hits_in_index_order() {
        let partition = Partition::new(vec![
            square("a", 0.0, 0.0, 1.0),
            square("b", 5.0, 5.0, 1.0),
            square("c", 0.5, 0.5, 1.0),
        ]).unwrap();

        let probe = Rect::new((0.2, 0.2), (0.8, 0.8));
        assert_eq!(partition.candidates(&probe), vec![0, 2]);
    }

    #[test]
    fn locate_finds_containing_region() {
        let partition = Partition::new(vec![square("a", 0.0, 0.0, 1.0), square("b", 1.0, 0.0, 1.0)]).unwrap();

        assert_eq!(partition.locate(&Point::new(0.5, 0.5)), Some(0));
        assert_eq!(partition.locate(&Point::new(1.5, 0.5)), Some(1));
        assert_eq!(partition.locate(&Point::new(3.0, 3.0)), None);
    }

    #[test]
    fn empty_partition_is_valid() {
        let partition = Partition::new(vec![]).unwrap();
        assert!(partition.is_empty());
        assert_eq!(partition.locate(&Point::new(0.0, 0.0)), None);
    }
}
