use std::{fmt, fs, path::Path, str::FromStr, sync::OnceLock};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, Point, Polygon};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::region::{Partition, Region, RegionId};

/// Where a feature's region id lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", content = "key", rename_all = "snake_case")]
pub enum IdSource {
    /// A named feature property, e.g. `cellId`.
    Property(String),
    /// A `<td>CODE</td>...<td>VALUE</td>` pair inside the HTML `description`
    /// property; underscores in the code are ignored.
    DescriptionCode(String),
}

impl FromStr for IdSource {
    type Err = anyhow::Error;

    /// `property:NAME`, `description:CODE`, or a bare property name.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some(("property", key)) => Ok(IdSource::Property(key.to_string())),
            Some(("description", code)) => Ok(IdSource::DescriptionCode(code.to_string())),
            Some((other, _)) => Err(anyhow!("Unknown id source {other:?} (expected property or description)")),
            None => Ok(IdSource::Property(s.to_string())),
        }
    }
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdSource::Property(key) => write!(f, "property:{key}"),
            IdSource::DescriptionCode(code) => write!(f, "description:{code}"),
        }
    }
}

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<td>(?P<code>[A-Za-z][^<]*)</td>.*?<td>(?P<val>\d+)")
            .expect("valid description regex")
    })
}

/// Find the value of `code` among the table cells of an HTML description.
fn description_value(description: &str, code: &str) -> Option<String> {
    description_regex().captures_iter(description)
        .find(|caps| caps["code"].replace('_', "") == code.replace('_', ""))
        .map(|caps| caps["val"].to_string())
}

fn property_id(value: &Value) -> Option<RegionId> {
    match value {
        Value::String(s) => Some(RegionId::from(s.as_str())),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => RegionId::from(i),
            None => RegionId::from(n.to_string()),
        }),
        _ => None,
    }
}

fn feature_id(properties: &Map<String, Value>, source: &IdSource) -> Option<RegionId> {
    match source {
        IdSource::Property(key) => properties.get(key).and_then(property_id),
        IdSource::DescriptionCode(code) => properties.get("description")
            .and_then(Value::as_str)
            .and_then(|description| description_value(description, code))
            .map(RegionId::from),
    }
}

/// Parse a ring from GeoJSON coordinates `[[x, y], ...]`, closing it if needed.
fn parse_ring_coords(coords: &[Value]) -> Result<LineString<f64>> {
    let mut points = Vec::with_capacity(coords.len());
    for pair in coords {
        let pair = pair.as_array()
            .filter(|p| p.len() >= 2)
            .ok_or_else(|| anyhow!("Invalid coordinate: expected [x, y]"))?;
        let x = pair[0].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
        let y = pair[1].as_f64().ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
        points.push(Coord { x, y });
    }

    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

/// Parse the regions of a FeatureCollection. Only `Polygon` features are
/// used (exterior ring only); every polygon must resolve an id.
pub fn parse_regions_geojson(value: &Value, ids: &IdSource) -> Result<Vec<Region>> {
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Not a FeatureCollection: missing features array"))?;

    let mut regions = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let geometry = &feature["geometry"];
        if geometry["type"].as_str() != Some("Polygon") {
            debug!("[io::geojson] skipping feature {i}: geometry is {}", geometry["type"]);
            continue;
        }

        let exterior = geometry["coordinates"].get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("[io::geojson] feature {i}: missing exterior ring"))?;
        let ring = parse_ring_coords(exterior)
            .with_context(|| format!("[io::geojson] feature {i}"))?;

        let empty = Map::new();
        let properties = feature["properties"].as_object().unwrap_or(&empty);
        let id = feature_id(properties, ids)
            .ok_or_else(|| anyhow!("[io::geojson] feature {i}: no id found at {ids}"))?;

        regions.push(Region::new(id, Polygon::new(ring, vec![])));
    }
    Ok(regions)
}

/// GeoJSON files under `path`: the file itself, or every `.geojson`/`.json`
/// file directly inside the directory, sorted.
fn geojson_files(path: &Path) -> Result<Vec<std::path::PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = WalkDir::new(path).min_depth(1).max_depth(1).into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|p| p.is_file() && matches!(p.extension().and_then(|e| e.to_str()), Some("geojson" | "json")))
        .collect::<Vec<_>>();
    files.sort();
    if files.is_empty() {
        bail!("[io::geojson] no GeoJSON files in {}", path.display());
    }
    Ok(files)
}

fn read_value(path: &Path) -> Result<Value> {
    let bytes = fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to open {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse {}", path.display()))
}

/// Load a partition from a GeoJSON file, or from every GeoJSON file in a directory.
pub fn read_partition_geojson(path: &Path, ids: &IdSource) -> Result<Partition> {
    let mut regions = Vec::new();
    for file in geojson_files(path)? {
        let parsed = parse_regions_geojson(&read_value(&file)?, ids)
            .with_context(|| format!("[io::geojson] in {}", file.display()))?;
        debug!("[io::geojson] {} regions from {}", parsed.len(), file.display());
        regions.extend(parsed);
    }
    Partition::new(regions).with_context(|| format!("[io::geojson] partition {}", path.display()))
}

/// A located record: a point and the feature's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub point: Point<f64>,
    pub properties: Map<String, Value>,
}

/// Read the point features of a FeatureCollection.
///
/// By default the point is the feature's `Point` geometry and other features
/// are skipped. With `coords_key`, the point is read from that member of the
/// feature instead (an object with `coordinates`, as in exported tweet dumps),
/// and a feature without it is an error.
pub fn read_points_geojson(path: &Path, coords_key: Option<&str>) -> Result<Vec<PointFeature>> {
    let value = read_value(path)?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] {} is not a FeatureCollection", path.display()))?;

    let mut points = Vec::new();
    for (i, feature) in features.iter().enumerate() {
        let geometry = match coords_key {
            Some(key) => &feature[key],
            None => &feature["geometry"],
        };
        if coords_key.is_none() && geometry["type"].as_str() != Some("Point") { continue }

        let coords = &geometry["coordinates"];
        let (Some(x), Some(y)) = (coords[0].as_f64(), coords[1].as_f64()) else {
            bail!("[io::geojson] {} feature {i}: invalid point coordinates", path.display());
        };
        let properties = match coords_key {
            // Flat records keep their other members as properties.
            Some(key) => feature.as_object().cloned().unwrap_or_default()
                .into_iter()
                .filter(|(k, _)| k != key && k != "type")
                .collect(),
            None => feature["properties"].as_object().cloned().unwrap_or_default(),
        };
        points.push(PointFeature { point: Point::new(x, y), properties });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x: f64, y: f64) -> Value {
        json!([[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]]])
    }

    #[test]
    fn ids_from_numeric_properties() {
        let fc = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"cellId": 4455}, "geometry": {"type": "Polygon", "coordinates": square(0.0, 0.0)}},
            {"type": "Feature", "properties": {"cellId": "x7"}, "geometry": {"type": "Polygon", "coordinates": square(1.0, 0.0)}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}},
        ]});
        let regions = parse_regions_geojson(&fc, &IdSource::Property("cellId".into())).unwrap();
        assert_eq!(regions.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["4455", "x7"]);
    }

    #[test]
    fn ids_from_html_description() {
        let description = "<table><tr><td>COD_REG</td><td>3</td></tr>\n<tr><td>SEZ_2011</td><td>151460000001</td></tr></table>";
        let fc = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"description": description}, "geometry": {"type": "Polygon", "coordinates": square(0.0, 0.0)}},
        ]});
        let regions = parse_regions_geojson(&fc, &IdSource::DescriptionCode("SEZ2011".into())).unwrap();
        assert_eq!(regions[0].id.as_str(), "151460000001");
    }

    #[test]
    fn missing_id_is_an_error() {
        let fc = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"other": 1}, "geometry": {"type": "Polygon", "coordinates": square(0.0, 0.0)}},
        ]});
        let err = parse_regions_geojson(&fc, &IdSource::Property("cellId".into())).unwrap_err();
        assert!(err.to_string().contains("feature 0"));
    }

    #[test]
    fn id_source_syntax() {
        assert_eq!("cellId".parse::<IdSource>().unwrap(), IdSource::Property("cellId".into()));
        assert_eq!("description:SEZ2011".parse::<IdSource>().unwrap(), IdSource::DescriptionCode("SEZ2011".into()));
        assert!("tag:x".parse::<IdSource>().is_err());
        assert_eq!(IdSource::DescriptionCode("SEZ2011".into()).to_string(), "description:SEZ2011");
    }

    #[test]
    fn points_from_geometry_or_named_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.geojson");
        let fc = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.1, 45.4]}, "properties": {"user": "a"}},
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": square(0.0, 0.0)}, "properties": {}},
        ]});
        fs::write(&path, fc.to_string()).unwrap();
        let points = read_points_geojson(&path, None).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].point, Point::new(9.1, 45.4));
        assert_eq!(points[0].properties["user"], "a");

        let flat = json!({"type": "FeatureCollection", "features": [
            {"geomPoint.geom": {"type": "Point", "coordinates": [9.2, 45.5]}, "user": "b", "language": "it"},
        ]});
        fs::write(&path, flat.to_string()).unwrap();
        let points = read_points_geojson(&path, Some("geomPoint.geom")).unwrap();
        assert_eq!(points[0].point, Point::new(9.2, 45.5));
        assert_eq!(points[0].properties.len(), 2);
        assert_eq!(points[0].properties["language"], "it");
    }

    #[test]
    fn directory_of_files_forms_one_partition() {
        let dir = tempfile::tempdir().unwrap();
        for (name, id, x) in [("b.geojson", 2, 1.0), ("a.geojson", 1, 0.0)] {
            let fc = json!({"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"id": id}, "geometry": {"type": "Polygon", "coordinates": square(x, 0.0)}},
            ]});
            fs::write(dir.path().join(name), fc.to_string()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let partition = read_partition_geojson(dir.path(), &IdSource::Property("id".into())).unwrap();
        assert_eq!(partition.len(), 2);
        assert_eq!(partition.id(0).as_str(), "1");
    }
}
