use std::collections::BTreeMap;

use anyhow::Result;
use cellgraph::{assign_points, mean_count, read_partition, read_points_geojson, write_json_atomic, PointFeature, Settings};
use log::info;
use serde_json::{json, Value};

use super::write_artifact;
use crate::cli::AssignArgs;

/// A point's properties plus its `coords`.
fn record(feature: &PointFeature) -> Value {
    let mut object = feature.properties.clone();
    object.insert("coords".into(), json!([feature.point.x(), feature.point.y()]));
    Value::Object(object)
}

pub fn run(_settings: &Settings, args: &AssignArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./assignment.json".into());

    let partition = read_partition(&args.regions, &args.ids)?;
    let points = read_points_geojson(&args.points, args.coords_key.as_deref())?;
    info!("[assign] {} points over {} regions", points.len(), partition.len());

    let assignment = assign_points(&partition, points, |feature| feature.point);

    let regions = assignment.regions.iter()
        .map(|(id, features)| (id.as_str(), features.iter().map(record).collect::<Vec<_>>()))
        .collect::<BTreeMap<_, _>>();
    write_json_atomic(&out_path, &regions)?;

    let unassigned = assignment.unassigned.iter().map(record).collect::<Vec<_>>();
    write_artifact(&out_path, "unassigned", &unassigned, unassigned.len())?;

    if let Some(field) = &args.distinct {
        let counts = assignment.distinct_counts(|feature| feature.properties.get(field).map(Value::to_string));
        if let Some(mean) = mean_count(&counts) {
            info!("[assign] mean distinct {field} per region: {mean:.3}");
        }
        write_artifact(&out_path, &format!("distinct_{field}"), &counts, counts.len())?;
    }
    Ok(())
}
