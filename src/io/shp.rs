use std::path::Path;

use anyhow::{anyhow, Context, Result};
use geo::{Area, Coord, LineString, Polygon};
use log::debug;
use shapefile::{dbase::FieldValue, PolygonRing, Reader, Shape};

use crate::region::{Partition, Region, RegionId};

/// Largest outer ring of a shapefile polygon, as a simple polygon.
fn outer_polygon(p: &shapefile::Polygon) -> Option<Polygon<f64>> {
    p.rings().iter()
        .filter_map(|ring| match ring {
            PolygonRing::Outer(points) => {
                let mut coords = points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect::<Vec<_>>();
                if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
                    coords.push(coords[0]);
                }
                Some(Polygon::new(LineString(coords), vec![]))
            }
            PolygonRing::Inner(_) => None,
        })
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
}

/// Region id from a dBase field. Whole numbers keep their integer form.
fn record_id(value: &FieldValue) -> Option<RegionId> {
    let from_float = |x: f64| {
        if x.fract() == 0.0 && x.abs() < i64::MAX as f64 { RegionId::from(x as i64) } else { RegionId::from(x.to_string()) }
    };
    match value {
        FieldValue::Character(Some(s)) => Some(RegionId::from(s.trim())),
        FieldValue::Numeric(Some(x)) => Some(from_float(*x)),
        FieldValue::Float(Some(x)) => Some(from_float(*x as f64)),
        FieldValue::Double(x) => Some(from_float(*x)),
        FieldValue::Integer(i) => Some(RegionId::from(*i as i64)),
        _ => None,
    }
}

/// Load a partition from a polygon shapefile, taking ids from `id_field`.
pub fn read_partition_shapefile(path: &Path, id_field: &str) -> Result<Partition> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut regions = Vec::new();
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[io::shp] Error reading shape+record {i} of {}", path.display()))?;

        let polygon = match &shape {
            Shape::Polygon(p) => outer_polygon(p),
            other => {
                debug!("[io::shp] skipping record {i}: {:?} shape", other.shapetype());
                continue;
            }
        };
        let Some(polygon) = polygon else {
            debug!("[io::shp] skipping record {i}: no outer ring");
            continue;
        };

        let id = record.get(id_field)
            .and_then(record_id)
            .ok_or_else(|| anyhow!("[io::shp] record {i} of {} has no usable {id_field:?} field", path.display()))?;
        regions.push(Region::new(id, polygon));
    }

    Partition::new(regions).with_context(|| format!("[io::shp] partition {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_become_integer_ids() {
        assert_eq!(record_id(&FieldValue::Numeric(Some(151460000001.0))).unwrap().as_str(), "151460000001");
        assert_eq!(record_id(&FieldValue::Double(2.5)).unwrap().as_str(), "2.5");
        assert_eq!(record_id(&FieldValue::Integer(7)).unwrap().as_str(), "7");
        assert_eq!(record_id(&FieldValue::Character(Some(" A1 ".into()))).unwrap().as_str(), "A1");
        assert!(record_id(&FieldValue::Character(None)).is_none());
    }

    #[test]
    fn largest_outer_ring_wins() {
        use shapefile::Point;
        let ring = |x0: f64, s: f64| vec![
            Point::new(x0, 0.0), Point::new(x0, s), Point::new(x0 + s, s), Point::new(x0 + s, 0.0), Point::new(x0, 0.0),
        ];
        let p = shapefile::Polygon::with_rings(vec![PolygonRing::Outer(ring(0.0, 1.0)), PolygonRing::Outer(ring(5.0, 3.0))]);
        let polygon = outer_polygon(&p).unwrap();
        assert!((polygon.unsigned_area() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_has_context() {
        let err = read_partition_shapefile(Path::new("/nonexistent/blocks.shp"), "SEZ2011").unwrap_err();
        assert!(err.to_string().contains("blocks.shp"));
    }
}
