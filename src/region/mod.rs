mod bbox;
mod partition;

use std::{fmt, sync::Arc};

use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};

pub use partition::Partition;

/// Stable key for a region of a spatial partition (grid cell id, census block code).
/// Integer identifiers are kept in their canonical decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(Arc<str>);

impl RegionId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[inline] pub fn as_str(&self) -> &str { &self.0 }

    /// Shared handle to the underlying text.
    #[inline] pub(crate) fn shared(&self) -> Arc<str> { self.0.clone() }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for RegionId {
    fn borrow(&self) -> &str { &self.0 }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self { Self::new(id) }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self { Self(Arc::from(id)) }
}

impl From<i64> for RegionId {
    fn from(id: i64) -> Self { Self(Arc::from(id.to_string())) }
}

impl From<Arc<str>> for RegionId {
    fn from(id: Arc<str>) -> Self { Self(id) }
}

/// A single region: identifier plus a simple polygon (exterior ring only).
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub polygon: Polygon<f64>,
}

impl Region {
    /// Interior rings are discarded; regions are simple polygons.
    pub fn new(id: impl Into<RegionId>, polygon: Polygon<f64>) -> Self {
        let (exterior, _) = polygon.into_inner();
        Self { id: id.into(), polygon: Polygon::new(exterior, vec![]) }
    }

    /// Build a region from a ring of (lon, lat) pairs. The ring is closed if needed.
    pub fn from_ring(id: impl Into<RegionId>, ring: &[(f64, f64)]) -> Self {
        Self::new(id, Polygon::new(LineString::from(ring.to_vec()), vec![]))
    }
}
