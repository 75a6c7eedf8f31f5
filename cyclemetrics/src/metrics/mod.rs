//! Cycling-friendliness metrics.
//!
//! Every engine is a pure function over borrowed collections. Empty inputs
//! never fail: they produce NaN (whole-area metrics) or no row at all (region
//! metrics).

pub mod administrative;
pub mod density;
pub mod distance;
pub mod proximity;

use geo::MultiPolygon;
use serde::Serialize;

use crate::geometric::building::BuildingCollection;
use crate::geometric::route::RouteCollection;

use density::{route_density, study_area_from_buildings};
use distance::{mean_nearest_distance, nearest_route_distance};
use proximity::{buffer_routes, buildings_near_routes, DEFAULT_BUFFER_DISTANCE_M};

/// The three metrics of a study area or region
///
/// Serializes to exactly these three keys; NaN values become `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsResult {
    /// Percentage (0-100) of buildings within the buffer distance of a route
    pub pct_buildings_near_route: f64,
    /// Mean distance from a building to the nearest route, meters
    pub avg_distance_to_route_m: f64,
    /// Route length per area, km/km²
    pub route_density_km_per_km2: f64,
}

impl MetricsResult {
    pub fn nan() -> Self {
        MetricsResult {
            pct_buildings_near_route: f64::NAN,
            avg_distance_to_route_m: f64::NAN,
            route_density_km_per_km2: f64::NAN,
        }
    }

    /// `(name, value)` pairs in a fixed order, for tabular output
    pub fn fields(&self) -> [(&'static str, f64); 3] {
        [
            ("pct_buildings_near_route", self.pct_buildings_near_route),
            ("avg_distance_to_route_m", self.avg_distance_to_route_m),
            ("route_density_km_per_km2", self.route_density_km_per_km2),
        ]
    }

    /// Field-wise comparison treating two NaN as equal
    pub fn approx_eq(&self, other: &MetricsResult, tolerance: f64) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|((_, a), (_, b))| (a.is_nan() && b.is_nan()) || (a - b).abs() <= tolerance)
    }
}

/// Metrics of one administrative region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMetrics {
    pub region_name: String,
    #[serde(flatten)]
    pub metrics: MetricsResult,
}

/// Options of a whole-area analysis
#[derive(Debug, Clone, PartialEq)]
pub struct StudyAreaOptions {
    pub buffer_distance_m: f64,
    /// Explicit study boundary; the convex hull of the buildings when `None`
    pub study_area: Option<MultiPolygon<f64>>,
}

impl Default for StudyAreaOptions {
    fn default() -> Self {
        StudyAreaOptions {
            buffer_distance_m: DEFAULT_BUFFER_DISTANCE_M,
            study_area: None,
        }
    }
}

/// Result of a whole-area analysis
#[derive(Debug, Clone)]
pub struct StudyAreaAnalysis {
    pub metrics: MetricsResult,
    /// Input buildings with the `nearest_route_m` column attached
    pub buildings: BuildingCollection,
}

/// Run the proximity, distance and density engines over one study area
pub fn analyze_study_area(
    routes: &RouteCollection,
    buildings: &BuildingCollection,
    options: &StudyAreaOptions,
) -> StudyAreaAnalysis {
    let buffered = buffer_routes(routes, options.buffer_distance_m);
    let pct_near = buildings_near_routes(buildings, &buffered);

    let buildings_with_dist = nearest_route_distance(buildings, routes);
    let avg_distance = mean_nearest_distance(&buildings_with_dist);

    let density = match &options.study_area {
        Some(area) => route_density(routes, area),
        None => route_density(routes, &study_area_from_buildings(buildings)),
    };

    StudyAreaAnalysis {
        metrics: MetricsResult {
            pct_buildings_near_route: pct_near,
            avg_distance_to_route_m: avg_distance,
            route_density_km_per_km2: density,
        },
        buildings: buildings_with_dist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point};

    #[test]
    fn test_analyze_study_area_outputs() {
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 100.0)]],
            Some(28992),
        );
        let buildings = BuildingCollection::from_points(
            vec![
                point!(x: 10.0, y: 0.0),
                point!(x: 200.0, y: 0.0),
                point!(x: 10.0, y: 100.0),
            ],
            Some(28992),
        );

        let analysis = analyze_study_area(&routes, &buildings, &StudyAreaOptions::default());
        let metrics = analysis.metrics;

        // (200, 0) is exactly 200 m away, outside the 100 m buffer
        assert!((metrics.pct_buildings_near_route - 200.0 / 3.0).abs() < 1e-9);
        assert!((metrics.avg_distance_to_route_m - 220.0 / 3.0).abs() < 1e-9);
        // Hull is the triangle (10,0) (200,0) (10,100): 9500 m²
        let expected_density = 0.1 / (9500.0 / 1e6);
        assert!((metrics.route_density_km_per_km2 - expected_density).abs() < 1e-9);

        assert_eq!(analysis.buildings.nearest_route_m().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_buildings_handling() {
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 100.0)]],
            Some(28992),
        );
        let buildings = BuildingCollection::default();

        let metrics = analyze_study_area(&routes, &buildings, &StudyAreaOptions::default()).metrics;
        assert!(metrics.pct_buildings_near_route.is_nan());
        assert!(metrics.avg_distance_to_route_m.is_nan());
        assert!(metrics.route_density_km_per_km2.is_nan());
    }

    #[test]
    fn test_metrics_json_keys() {
        let metrics = MetricsResult {
            pct_buildings_near_route: 50.0,
            avg_distance_to_route_m: f64::NAN,
            route_density_km_per_km2: 1.5,
        };
        let json = serde_json::to_value(metrics).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert_eq!(object["pct_buildings_near_route"], 50.0);
        assert!(object["avg_distance_to_route_m"].is_null());
        assert_eq!(object["route_density_km_per_km2"], 1.5);
    }

    #[test]
    fn test_region_metrics_json_is_flat() {
        let row = RegionMetrics {
            region_name: "Centrum".to_string(),
            metrics: MetricsResult::nan(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["region_name"], "Centrum");
        assert!(json["route_density_km_per_km2"].is_null());
    }

    #[test]
    fn test_approx_eq_with_nan() {
        let a = MetricsResult::nan();
        let mut b = MetricsResult::nan();
        assert!(a.approx_eq(&b, 1e-9));

        b.pct_buildings_near_route = 1.0;
        assert!(!a.approx_eq(&b, 1e-9));
    }
}
