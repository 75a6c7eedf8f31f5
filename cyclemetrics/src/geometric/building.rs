use anyhow::{Context, Result};
use geo::{MultiPoint, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value as GeoJsonValue};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Name of the derived per-building distance column
pub const NEAREST_ROUTE_FIELD: &str = "nearest_route_m";

/// A building reduced to a point location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub location: Point<f64>,
    /// GeoJSON properties carried over from the source feature
    pub properties: Map<String, Value>,
}

impl Building {
    pub fn new(location: Point<f64>) -> Self {
        Building {
            location,
            properties: Map::new(),
        }
    }

    pub fn with_properties(location: Point<f64>, properties: Map<String, Value>) -> Self {
        Building {
            location,
            properties,
        }
    }
}

/// Ordered collection of building points sharing one CRS
///
/// Geometry is never modified once loaded. Derived values computed by the
/// metric engines are attached as extra columns, producing a new collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildingCollection {
    buildings: Vec<Building>,
    epsg: Option<i32>,
    /// Distance to the nearest route, one entry per building once attached
    nearest_route_m: Option<Vec<f64>>,
}

impl BuildingCollection {
    pub fn new(buildings: Vec<Building>, epsg: Option<i32>) -> Self {
        BuildingCollection {
            buildings,
            epsg,
            nearest_route_m: None,
        }
    }

    /// Build a collection from bare points (tests, synthetic inputs)
    pub fn from_points<I>(points: I, epsg: Option<i32>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Point<f64>>,
    {
        let buildings = points
            .into_iter()
            .map(|p| Building::new(p.into()))
            .collect();
        Self::new(buildings, epsg)
    }

    pub fn epsg(&self) -> Option<i32> {
        self.epsg
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Building> {
        self.buildings.iter()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point<f64>> + '_ {
        self.buildings.iter().map(|b| &b.location)
    }

    /// All building locations as one geometry
    pub fn to_multi_point(&self) -> MultiPoint<f64> {
        MultiPoint::new(self.points().copied().collect())
    }

    /// Keep only the buildings matching `predicate`
    ///
    /// Derived columns are dropped: they describe the parent collection.
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Building) -> bool,
    {
        let buildings = self
            .buildings
            .iter()
            .filter(|b| predicate(b))
            .cloned()
            .collect();
        Self::new(buildings, self.epsg)
    }

    /// Distances attached by the distance engine, if any
    pub fn nearest_route_m(&self) -> Option<&[f64]> {
        self.nearest_route_m.as_deref()
    }

    /// Return a copy carrying `distances` as the nearest-route column
    pub(crate) fn with_nearest_route_m(&self, distances: Vec<f64>) -> Self {
        debug_assert_eq!(distances.len(), self.buildings.len());
        BuildingCollection {
            buildings: self.buildings.clone(),
            epsg: self.epsg,
            nearest_route_m: Some(distances),
        }
    }

    /// Convert the collection to a Polars DataFrame (`x`, `y`, `nearest_route_m`)
    pub fn to_polars_df(&self) -> Result<DataFrame> {
        let xs: Vec<f64> = self.points().map(|p| p.x()).collect();
        let ys: Vec<f64> = self.points().map(|p| p.y()).collect();
        let distances: Vec<Option<f64>> = match &self.nearest_route_m {
            Some(d) => d.iter().copied().map(Some).collect(),
            None => vec![None; self.buildings.len()],
        };

        let df = df! [
            "x" => xs,
            "y" => ys,
            NEAREST_ROUTE_FIELD => distances,
        ]
        .context("Failed to create DataFrame")?;

        Ok(df)
    }

    /// Convert to a GeoJSON FeatureCollection, distances written as a property
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .buildings
            .iter()
            .enumerate()
            .map(|(idx, building)| {
                let mut properties = building.properties.clone();
                if let Some(distances) = &self.nearest_route_m {
                    // NaN has no JSON form and ends up as null
                    properties.insert(
                        NEAREST_ROUTE_FIELD.to_string(),
                        serde_json::Number::from_f64(distances[idx])
                            .map(Value::Number)
                            .unwrap_or(Value::Null),
                    );
                }
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(GeoJsonValue::from(&building.location))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: crs_member(self.epsg),
        }
    }

    /// Save to a GeoJSON file
    pub fn to_geojson<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let output_file = output_file.as_ref();
        let geojson_str = GeoJson::FeatureCollection(self.to_feature_collection()).to_string();
        std::fs::write(output_file, geojson_str)
            .with_context(|| format!("Failed to write GeoJSON file: {:?}", output_file))?;

        tracing::info!(
            path = %output_file.display(),
            buildings = self.len(),
            "Buildings saved"
        );
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BuildingCollection {
    type Item = &'a Building;
    type IntoIter = std::slice::Iter<'a, Building>;

    fn into_iter(self) -> Self::IntoIter {
        self.buildings.iter()
    }
}

/// Legacy GeoJSON `crs` member, so projected output keeps its CRS
pub(crate) fn crs_member(epsg: Option<i32>) -> Option<Map<String, Value>> {
    let epsg = epsg?;
    let mut member = Map::new();
    member.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", epsg) }
        }),
    );
    Some(member)
}
