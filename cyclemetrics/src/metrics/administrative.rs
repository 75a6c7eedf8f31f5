//! Metrics per administrative region.
//!
//! Each region clips the route network to its boundary, keeps the buildings
//! strictly inside it, and reruns the three engines. Regions without routes or
//! without buildings produce no row. The rows are finally left-joined back
//! onto the region table, so regions without data keep null metrics.

use anyhow::{Context, Result};
use geo::{BooleanOps, Within};
use polars::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::geometric::building::BuildingCollection;
use crate::geometric::region::Region;
use crate::geometric::route::{Route, RouteCollection};
use crate::metrics::density::route_density;
use crate::metrics::distance::{mean_nearest_distance, nearest_route_distance};
use crate::metrics::proximity::{buffer_routes, buildings_near_routes};
use crate::metrics::{MetricsResult, RegionMetrics};

/// Column names of the per-region metrics table
pub const REGION_NAME_COLUMN: &str = "region_name";
pub const PCT_NEAR_COLUMN: &str = "pct_buildings_near_route";
pub const AVG_DISTANCE_COLUMN: &str = "avg_distance_to_route_m";
pub const DENSITY_COLUMN: &str = "route_density_km_per_km2";

const METRIC_COLUMNS: [&str; 4] = [
    REGION_NAME_COLUMN,
    PCT_NEAR_COLUMN,
    AVG_DISTANCE_COLUMN,
    DENSITY_COLUMN,
];

/// Routes truncated at the region boundary
///
/// Routes entirely outside the region disappear; the rest keep their
/// properties with only the inside parts of their geometry.
pub fn clip_routes(routes: &RouteCollection, region: &Region) -> RouteCollection {
    let clipped = routes
        .iter()
        .filter_map(|route| {
            let mut inside = region.geometry.clip(&route.geometry, false);
            inside.0.retain(|ls| ls.0.len() >= 2);
            if inside.0.is_empty() {
                None
            } else {
                Some(Route::with_properties(inside, route.properties.clone()))
            }
        })
        .collect();

    RouteCollection::new(clipped, routes.epsg())
}

/// Buildings lying strictly inside the region (boundary points excluded)
pub fn buildings_within(buildings: &BuildingCollection, region: &Region) -> BuildingCollection {
    buildings.filter(|b| b.location.is_within(&region.geometry))
}

/// Metrics of a single region, `None` when it has no routes or no buildings
pub fn analyze_region(
    routes: &RouteCollection,
    buildings: &BuildingCollection,
    region: &Region,
    buffer_distance_m: f64,
) -> Option<RegionMetrics> {
    let region_routes = clip_routes(routes, region);
    let region_buildings = buildings_within(buildings, region);

    if region_routes.is_empty() || region_buildings.is_empty() {
        tracing::debug!(
            region = %region.name,
            routes = region_routes.len(),
            buildings = region_buildings.len(),
            "Skipping region without data"
        );
        return None;
    }

    let pct_near = buildings_near_routes(
        &region_buildings,
        &buffer_routes(&region_routes, buffer_distance_m),
    );

    let region_buildings = nearest_route_distance(&region_buildings, &region_routes);
    let avg_dist = mean_nearest_distance(&region_buildings);

    // The region's own area, never the building hull
    let density = route_density(&region_routes, &region.geometry);

    Some(RegionMetrics {
        region_name: region.name.clone(),
        metrics: MetricsResult {
            pct_buildings_near_route: pct_near,
            avg_distance_to_route_m: avg_dist,
            route_density_km_per_km2: density,
        },
    })
}

/// Metrics of every region with data, in region order
pub fn analyze_by_admin_region(
    routes: &RouteCollection,
    buildings: &BuildingCollection,
    regions: &[Region],
    buffer_distance_m: f64,
) -> Vec<RegionMetrics> {
    #[cfg(feature = "rayon")]
    let results: Vec<RegionMetrics> = {
        use rayon::prelude::*;
        regions
            .par_iter()
            .filter_map(|region| analyze_region(routes, buildings, region, buffer_distance_m))
            .collect()
    };

    #[cfg(not(feature = "rayon"))]
    let results: Vec<RegionMetrics> = regions
        .iter()
        .filter_map(|region| analyze_region(routes, buildings, region, buffer_distance_m))
        .collect();

    tracing::info!(
        regions = regions.len(),
        with_metrics = results.len(),
        "Region analysis complete"
    );
    results
}

/// Per-region rows as a DataFrame keyed by `region_name`
pub fn region_metrics_to_polars_df(rows: &[RegionMetrics]) -> Result<DataFrame> {
    let names: Vec<String> = rows.iter().map(|r| r.region_name.clone()).collect();
    let pct: Vec<f64> = rows.iter().map(|r| r.metrics.pct_buildings_near_route).collect();
    let avg: Vec<f64> = rows.iter().map(|r| r.metrics.avg_distance_to_route_m).collect();
    let density: Vec<f64> = rows.iter().map(|r| r.metrics.route_density_km_per_km2).collect();

    let df = df! [
        REGION_NAME_COLUMN => names,
        PCT_NEAR_COLUMN => pct,
        AVG_DISTANCE_COLUMN => avg,
        DENSITY_COLUMN => density,
    ]
    .context("Failed to create region metrics DataFrame")?;

    Ok(df)
}

/// Region metadata as a DataFrame: `name`, `area_km2`, then one string column
/// per scalar property found on any region
pub fn regions_to_polars_df(regions: &[Region]) -> Result<DataFrame> {
    let names: Vec<String> = regions.iter().map(|r| r.name.clone()).collect();
    let areas: Vec<f64> = regions.iter().map(Region::area_km2).collect();

    let mut df = df! [
        "name" => names,
        "area_km2" => areas,
    ]
    .context("Failed to create region DataFrame")?;

    let keys: BTreeSet<&str> = regions
        .iter()
        .flat_map(|r| r.properties.keys().map(String::as_str))
        .filter(|k| *k != "name" && *k != "area_km2" && !METRIC_COLUMNS.contains(k))
        .collect();

    for key in keys {
        let values: Vec<Option<String>> = regions
            .iter()
            .map(|r| r.properties.get(key).and_then(scalar_to_string))
            .collect();
        df.with_column(Series::new(key.into(), values))
            .with_context(|| format!("Failed to add region column {}", key))?;
    }

    Ok(df)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Left join of the metrics table onto the region table by name
///
/// Every region is kept, in order; regions without a metrics row get null
/// metric columns.
pub fn join_metrics_to_regions(regions: &[Region], results: &DataFrame) -> Result<DataFrame> {
    let regions_df = regions_to_polars_df(regions)?;

    let joined = regions_df
        .lazy()
        .left_join(
            results.clone().lazy(),
            col("name"),
            col(REGION_NAME_COLUMN),
        )
        .collect()
        .context("Failed to join metrics onto regions")?;

    Ok(joined)
}
