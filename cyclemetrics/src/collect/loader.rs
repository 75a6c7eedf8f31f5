//! Geometry loader: GeoJSON files to planar collections.
//!
//! Empty geometries are dropped and everything is reprojected into the
//! configured target CRS, so the metric engines can assume metric planar
//! coordinates without checking.

use anyhow::{Context, Result};
use geo::{Centroid, CoordsIter, Geometry as GeoGeometry, MultiLineString, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::{Map, Value};
use std::path::Path;

use crate::collect::global_variables::GEOJSON_DEFAULT_EPSG;
use crate::config::AnalysisConfig;
use crate::error::CycleMetricsError;
use crate::geo_core::{GeoCore, Projector};
use crate::geometric::building::{Building, BuildingCollection};
use crate::geometric::region::Region;
use crate::geometric::route::{Route, RouteCollection};

/// Fail with `FileNotFound` unless `path` exists
pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CycleMetricsError::FileNotFound(path.to_path_buf()).into());
    }
    Ok(())
}

/// Read a GeoJSON file that must hold a FeatureCollection
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    ensure_exists(path)?;

    let content = std::fs::read_to_string(path)
        .map_err(CycleMetricsError::from)
        .with_context(|| format!("Failed to read GeoJSON file: {:?}", path))?;

    let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| {
        CycleMetricsError::InvalidGeoJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(f) => Ok(FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(CycleMetricsError::InvalidGeoJson {
            path: path.to_path_buf(),
            message: "GeoJSON must be a Feature or FeatureCollection".to_string(),
        }
        .into()),
    }
}

/// EPSG code declared by a legacy `crs` member
///
/// Accepts `urn:ogc:def:crs:EPSG::28992`, versioned URNs such as
/// `urn:ogc:def:crs:EPSG:6.3:28992`, `EPSG:28992` and the OGC CRS84 name.
/// `Ok(None)` when no CRS is declared; a declared CRS that cannot be read as an
/// EPSG code is an `UnsupportedCrs` error.
pub fn detect_epsg(fc: &FeatureCollection) -> Result<Option<i32>, CycleMetricsError> {
    let Some(crs) = fc.foreign_members.as_ref().and_then(|m| m.get("crs")) else {
        return Ok(None);
    };

    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str);

    match name.and_then(parse_crs_name) {
        Some(epsg) => Ok(Some(epsg)),
        None => Err(CycleMetricsError::UnsupportedCrs(
            name.map_or_else(|| crs.to_string(), str::to_string),
        )),
    }
}

fn parse_crs_name(name: &str) -> Option<i32> {
    let code = name.rsplit(':').next()?.trim();
    if code.eq_ignore_ascii_case("CRS84") {
        return Some(GEOJSON_DEFAULT_EPSG);
    }
    if !name.to_ascii_uppercase().contains("EPSG") {
        return None;
    }
    code.parse().ok()
}

/// Source CRS of a file: forced by config, else declared, else WGS84
fn source_epsg(
    fc: &FeatureCollection,
    config: &AnalysisConfig,
) -> Result<i32, CycleMetricsError> {
    if let Some(epsg) = config.source_epsg {
        return Ok(epsg);
    }
    Ok(detect_epsg(fc)?.unwrap_or(GEOJSON_DEFAULT_EPSG))
}

/// Non-empty geometries of a collection, reprojected, with their properties
fn planar_geometries(
    fc: &FeatureCollection,
    projector: &Projector,
    path: &Path,
) -> Result<Vec<(GeoGeometry<f64>, Map<String, Value>)>> {
    let mut geometries = Vec::with_capacity(fc.features.len());
    let mut empty = 0usize;

    for (idx, feature) in fc.features.iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref() else {
            empty += 1;
            continue;
        };

        let geometry: GeoGeometry<f64> = match geometry.try_into() {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(
                    feature = idx,
                    path = %path.display(),
                    error = %e,
                    "Skipping feature"
                );
                continue;
            }
        };

        if geometry.coords_count() == 0 {
            empty += 1;
            continue;
        }

        let projected = projector
            .apply(&geometry)
            .with_context(|| format!("Failed to reproject feature {} of {:?}", idx, path))?;
        geometries.push((projected, properties_of(feature)));
    }

    if empty > 0 {
        tracing::debug!(path = %path.display(), empty, "Dropped empty geometries");
    }
    Ok(geometries)
}

fn properties_of(feature: &Feature) -> Map<String, Value> {
    feature.properties.clone().unwrap_or_default()
}

fn as_multi_line_string(geometry: GeoGeometry<f64>) -> Option<MultiLineString<f64>> {
    match geometry {
        GeoGeometry::LineString(ls) => Some(MultiLineString::new(vec![ls])),
        GeoGeometry::MultiLineString(mls) => Some(mls),
        GeoGeometry::Line(line) => Some(MultiLineString::new(vec![line.into()])),
        _ => None,
    }
}

/// Building location: points as is, footprints reduced to their centroid
fn as_point(geometry: GeoGeometry<f64>) -> Option<Point<f64>> {
    match geometry {
        GeoGeometry::Point(p) => Some(p),
        GeoGeometry::MultiPoint(_) | GeoGeometry::Polygon(_) | GeoGeometry::MultiPolygon(_) => {
            geometry.centroid()
        }
        _ => None,
    }
}

fn as_multi_polygon(geometry: GeoGeometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        GeoGeometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        GeoGeometry::MultiPolygon(mp) => Some(mp),
        GeoGeometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        _ => None,
    }
}

/// Load a route layer (LineString / MultiLineString features)
pub fn load_routes(path: &Path, config: &AnalysisConfig) -> Result<RouteCollection> {
    let fc = read_feature_collection(path)?;
    let from_epsg = source_epsg(&fc, config)?;
    let geo_core = GeoCore::new(config.target_epsg);
    let projector = geo_core.projector(from_epsg)?;

    let mut skipped = 0usize;
    let routes: Vec<Route> = planar_geometries(&fc, &projector, path)?
        .into_iter()
        .filter_map(|(geometry, properties)| match as_multi_line_string(geometry) {
            Some(mls) => Some(Route::with_properties(mls, properties)),
            None => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "Ignored non-linear route features");
    }
    tracing::info!(
        path = %path.display(),
        routes = routes.len(),
        from_epsg,
        to_epsg = geo_core.get_epsg(),
        "Routes loaded"
    );

    Ok(RouteCollection::new(routes, Some(geo_core.get_epsg())))
}

/// Load a building layer (points, or footprints reduced to centroids)
pub fn load_buildings(path: &Path, config: &AnalysisConfig) -> Result<BuildingCollection> {
    let fc = read_feature_collection(path)?;
    let from_epsg = source_epsg(&fc, config)?;
    let geo_core = GeoCore::new(config.target_epsg);
    let projector = geo_core.projector(from_epsg)?;

    let mut skipped = 0usize;
    let buildings: Vec<Building> = planar_geometries(&fc, &projector, path)?
        .into_iter()
        .filter_map(|(geometry, properties)| match as_point(geometry) {
            Some(p) => Some(Building::with_properties(p, properties)),
            None => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped,
            "Ignored building features without a location"
        );
    }
    tracing::info!(
        path = %path.display(),
        buildings = buildings.len(),
        from_epsg,
        to_epsg = geo_core.get_epsg(),
        "Buildings loaded"
    );

    Ok(BuildingCollection::new(buildings, Some(geo_core.get_epsg())))
}

/// Load administrative regions; the region name comes from the `name` property
pub fn load_regions(path: &Path, config: &AnalysisConfig) -> Result<Vec<Region>> {
    let fc = read_feature_collection(path)?;
    let from_epsg = source_epsg(&fc, config)?;
    let projector = GeoCore::new(config.target_epsg).projector(from_epsg)?;

    let mut regions = Vec::new();
    for (geometry, mut properties) in planar_geometries(&fc, &projector, path)? {
        let Some(polygon) = as_multi_polygon(geometry) else {
            tracing::warn!(path = %path.display(), "Ignored non-polygon region feature");
            continue;
        };
        let name = match properties.remove("name") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                tracing::warn!(path = %path.display(), "Ignored region without a name");
                continue;
            }
        };
        regions.push(Region::new(name, polygon).with_properties(properties));
    }

    tracing::info!(path = %path.display(), regions = regions.len(), "Regions loaded");
    Ok(regions)
}

/// Load the route and building layers into the same planar CRS
///
/// Both paths are checked before either file is parsed.
pub fn load_data(
    routes_path: &Path,
    buildings_path: &Path,
    config: &AnalysisConfig,
) -> Result<(RouteCollection, BuildingCollection)> {
    ensure_exists(routes_path)?;
    ensure_exists(buildings_path)?;

    let routes = load_routes(routes_path, config)?;
    let buildings = load_buildings(buildings_path, config)?;
    Ok((routes, buildings))
}
