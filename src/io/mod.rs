//! File formats read and written by the pipeline.
//!
//! - `fs` - atomic write-then-rename and JSON helpers
//! - `geojson` - polygon partitions and point features
//! - `shp` - polygon partitions from shapefiles
//! - `csv` - attribute tables in, node tables out

pub(crate) mod csv;
pub(crate) mod fs;
pub(crate) mod geojson;
pub(crate) mod shp;

use std::path::Path;

use anyhow::Result;

use crate::region::Partition;

pub use self::csv::{node_table, read_attribute_csv, read_attribute_dir, write_node_tables};
pub use self::fs::{ensure_dir_exists, read_json, write_json_atomic, PendingWrite};
pub use self::geojson::{parse_regions_geojson, read_partition_geojson, read_points_geojson, IdSource, PointFeature};
pub use self::shp::read_partition_shapefile;

/// Load a partition from a shapefile (`.shp`) or GeoJSON file/directory.
/// Shapefiles take their id from the property or code named by `ids`.
pub fn read_partition(path: &Path, ids: &IdSource) -> Result<Partition> {
    let is_shp = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("shp"));
    match (is_shp, ids) {
        (true, IdSource::Property(field) | IdSource::DescriptionCode(field)) => read_partition_shapefile(path, field),
        (false, _) => read_partition_geojson(path, ids),
    }
}
