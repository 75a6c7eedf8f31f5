use geo::{Area, ConvexHull, LineString, Polygon};

use crate::commons::basic_functions::{m2_to_km2, m_to_km};
use crate::geometric::building::BuildingCollection;
use crate::geometric::route::RouteCollection;

/// Route length per unit area, in km/km²
///
/// NaN when the area is empty or zero: a density over nothing is undefined,
/// and must not surface as infinity.
pub fn route_density<A>(routes: &RouteCollection, area_polygon: &A) -> f64
where
    A: Area<f64>,
{
    let area_m2 = area_polygon.unsigned_area();
    if area_m2.is_nan() || area_m2 <= 0.0 {
        return f64::NAN;
    }

    m_to_km(routes.total_length()) / m2_to_km2(area_m2)
}

/// Study area used when no boundary is supplied: convex hull of all buildings
///
/// This is a coarse approximation kept for compatibility, not a
/// geodetic study boundary. A handful of outlying buildings can inflate it a
/// lot; fewer than three non-collinear buildings give a zero-area hull and
/// therefore a NaN density.
pub fn study_area_from_buildings(buildings: &BuildingCollection) -> Polygon<f64> {
    if buildings.is_empty() {
        return Polygon::new(LineString::new(vec![]), vec![]);
    }
    buildings.to_multi_point().convex_hull()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, Buffer, MultiPolygon};
    use std::f64::consts::PI;

    #[test]
    fn test_route_density_simple_case() {
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1000.0)]],
            Some(28992),
        );
        let area_polygon = point!(x: 0.0, y: 0.0).buffer(1000.0);

        let density = route_density(&routes, &area_polygon);
        let expected = 1.0 / (area_polygon.unsigned_area() / 1e6);
        assert!((density - expected).abs() < 1e-6);

        // Close to the exact disk value 1 / (pi * 1000^2 / 1e6)
        let exact = 1.0 / (PI * 1000.0 * 1000.0 / 1e6);
        assert!((density - exact).abs() / exact < 0.05);
    }

    #[test]
    fn test_square_density() {
        let routes = RouteCollection::from_geometries(
            vec![
                line_string![(x: 0.0, y: 0.0), (x: 2000.0, y: 0.0)],
                line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2000.0)],
            ],
            None,
        );
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 2000.0, y: 0.0),
            (x: 2000.0, y: 2000.0),
            (x: 0.0, y: 2000.0),
            (x: 0.0, y: 0.0),
        ];
        // 4 km over 4 km²
        assert!((route_density(&routes, &square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_area_is_nan() {
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1000.0)]],
            None,
        );
        let degenerate = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 20.0, y: 0.0),
            (x: 0.0, y: 0.0),
        ];
        let density = route_density(&routes, &degenerate);
        assert!(density.is_nan());
        assert!(!density.is_infinite());
    }

    #[test]
    fn test_empty_polygon_is_nan() {
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1000.0)]],
            None,
        );
        assert!(route_density(&routes, &MultiPolygon::<f64>::new(vec![])).is_nan());
        let empty_hull = study_area_from_buildings(&BuildingCollection::default());
        assert!(route_density(&routes, &empty_hull).is_nan());
    }

    #[test]
    fn test_study_area_from_buildings() {
        let buildings = BuildingCollection::from_points(
            vec![
                point!(x: 0.0, y: 0.0),
                point!(x: 1000.0, y: 0.0),
                point!(x: 1000.0, y: 1000.0),
                point!(x: 0.0, y: 1000.0),
                point!(x: 500.0, y: 500.0),
            ],
            None,
        );
        let hull = study_area_from_buildings(&buildings);
        assert!((hull.unsigned_area() - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_buildings_give_nan_density() {
        let buildings = BuildingCollection::from_points(
            vec![point!(x: 0.0, y: 0.0), point!(x: 10.0, y: 0.0)],
            None,
        );
        let routes = RouteCollection::from_geometries(
            vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]],
            None,
        );
        assert!(route_density(&routes, &study_area_from_buildings(&buildings)).is_nan());
    }
}
