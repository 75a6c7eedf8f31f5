//! Bike-only extraction from a road network layer with NWB-style access
//! columns (`J`/`N` flags per direction).

use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::{Map, Value};
use std::path::Path;

use crate::collect::loader::read_feature_collection;

/// Columns allowing bicycles, one per direction
pub const BIKE_COLUMNS: [&str; 2] = ["fiets_h", "fiets_t"];

/// Motorised traffic columns; all must be `N` on a bike-only segment
pub const MOTOR_COLUMNS: [&str; 12] = [
    "auto_h", "auto_t", "mtrfts_h", "mtrfts_t", "autobs_h", "autobs_t", "vrchtt_h", "vrchtt_t",
    "lndbw_h", "lndbw_t", "aanhngr_h", "aanhngr_t",
];

/// Properties kept on filtered segments
pub const KEPT_PROPERTIES: [&str; 3] = ["id", "fiets_h", "fiets_t"];

fn flag_is(properties: &Map<String, Value>, column: &str, flag: &str) -> bool {
    properties.get(column).and_then(Value::as_str) == Some(flag)
}

pub fn bike_allowed(properties: &Map<String, Value>) -> bool {
    BIKE_COLUMNS.iter().any(|c| flag_is(properties, c, "J"))
}

/// A missing motor column rejects the segment
pub fn no_motor_traffic(properties: &Map<String, Value>) -> bool {
    MOTOR_COLUMNS.iter().all(|c| flag_is(properties, c, "N"))
}

/// Summary of a filter run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub total: usize,
    pub kept: usize,
}

/// Keep bike-only segments, reducing their properties to [`KEPT_PROPERTIES`]
pub fn filter_bike_only(fc: &FeatureCollection) -> FeatureCollection {
    let features = fc
        .features
        .iter()
        .filter_map(|feature| {
            let properties = feature.properties.as_ref()?;
            if !(bike_allowed(properties) && no_motor_traffic(properties)) {
                return None;
            }

            let reduced: Map<String, Value> = KEPT_PROPERTIES
                .iter()
                .filter_map(|k| properties.get(*k).map(|v| (k.to_string(), v.clone())))
                .collect();

            Some(Feature {
                bbox: None,
                geometry: feature.geometry.clone(),
                id: feature.id.clone(),
                properties: Some(reduced),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: fc.foreign_members.clone(),
    }
}

/// Read a road network GeoJSON, keep bike-only segments, write them to `output`
pub fn geojson_to_bike_geojson<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<FilterSummary> {
    let input = input.as_ref();
    let output = output.as_ref();

    let fc = read_feature_collection(input)?;
    let filtered = filter_bike_only(&fc);
    let summary = FilterSummary {
        total: fc.features.len(),
        kept: filtered.features.len(),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    std::fs::write(output, GeoJson::FeatureCollection(filtered).to_string())
        .with_context(|| format!("Failed to write GeoJSON file: {:?}", output))?;

    tracing::info!(
        "{} → {} bike-only segments ({})",
        summary.total,
        summary.kept,
        output.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn all_motor_n() -> Map<String, Value> {
        MOTOR_COLUMNS
            .iter()
            .map(|c| (c.to_string(), Value::String("N".to_string())))
            .collect()
    }

    fn segment(id: i64, fiets_h: &str, fiets_t: &str, motor: Map<String, Value>) -> Feature {
        let mut properties = motor;
        properties.insert("id".to_string(), json!(id));
        properties.insert("fiets_h".to_string(), json!(fiets_h));
        properties.insert("fiets_t".to_string(), json!(fiets_t));
        properties.insert("stt_naam".to_string(), json!("Hengelosestraat"));
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(vec![
                vec![0.0, 0.0],
                vec![0.0, 10.0],
            ]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    #[test]
    fn test_bike_allowed_either_direction() {
        assert!(bike_allowed(&props(json!({"fiets_h": "J", "fiets_t": "N"}))));
        assert!(bike_allowed(&props(json!({"fiets_t": "J"}))));
        assert!(!bike_allowed(&props(json!({"fiets_h": "N", "fiets_t": "N"}))));
        assert!(!bike_allowed(&Map::new()));
    }

    #[test]
    fn test_missing_motor_column_rejects() {
        let mut motor = all_motor_n();
        assert!(no_motor_traffic(&motor));

        motor.remove("aanhngr_t");
        assert!(!no_motor_traffic(&motor));

        let mut motor = all_motor_n();
        motor.insert("auto_h".to_string(), json!("J"));
        assert!(!no_motor_traffic(&motor));
    }

    #[test]
    fn test_filter_bike_only() {
        let mut car_road = all_motor_n();
        car_road.insert("auto_t".to_string(), json!("J"));

        let fc = FeatureCollection {
            bbox: None,
            features: vec![
                segment(1, "J", "J", all_motor_n()),
                segment(2, "J", "N", car_road),
                segment(3, "N", "N", all_motor_n()),
                segment(4, "N", "J", all_motor_n()),
            ],
            foreign_members: None,
        };

        let filtered = filter_bike_only(&fc);
        assert_eq!(filtered.features.len(), 2);

        let first = filtered.features[0].properties.as_ref().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first["id"], 1);
        assert!(!first.contains_key("stt_naam"));
        assert!(filtered.features[0].geometry.is_some());
        assert_eq!(filtered.features[1].properties.as_ref().unwrap()["id"], 4);
    }

    #[test]
    fn test_geojson_to_bike_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("network.geojson");
        let output = dir.path().join("out").join("bike.geojson");

        let fc = FeatureCollection {
            bbox: None,
            features: vec![
                segment(1, "J", "N", all_motor_n()),
                segment(2, "N", "N", all_motor_n()),
            ],
            foreign_members: None,
        };
        std::fs::write(&input, GeoJson::FeatureCollection(fc).to_string()).unwrap();

        let summary = geojson_to_bike_geojson(&input, &output).unwrap();
        assert_eq!(summary, FilterSummary { total: 2, kept: 1 });

        let written = read_feature_collection(&output).unwrap();
        assert_eq!(written.features.len(), 1);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("none.geojson");
        let output = dir.path().join("o.geojson");
        let err = geojson_to_bike_geojson(input, output).err().unwrap();
        assert!(err
            .downcast_ref::<crate::error::CycleMetricsError>()
            .is_some_and(|e| e.is_not_found()));
    }
}
