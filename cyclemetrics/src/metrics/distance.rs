//! Distance from each building to the route network.

use geo::Point;
use rstar::primitives::Line as Segment;
use rstar::{PointDistance, RTree};

use crate::commons::basic_functions::mean;
use crate::geometric::building::BuildingCollection;
use crate::geometric::route::RouteCollection;

/// All route segments merged into one queryable network
///
/// This is the union of the route geometries for the purpose of distance
/// queries: segments are only indexed together, never split, snapped or
/// noded, so the distance to the network equals the minimum distance over all
/// segments.
pub struct RouteNetwork {
    tree: RTree<Segment<[f64; 2]>>,
}

impl RouteNetwork {
    pub fn from_routes(routes: &RouteCollection) -> Self {
        let mut segments = Vec::new();
        for line_string in routes.iter().flat_map(|route| route.geometry.iter()) {
            match line_string.0.as_slice() {
                [] => {}
                // A lone vertex still locates a point of the network
                [c] => segments.push(Segment::new([c.x, c.y], [c.x, c.y])),
                _ => segments.extend(
                    line_string
                        .lines()
                        .map(|l| Segment::new([l.start.x, l.start.y], [l.end.x, l.end.y])),
                ),
            }
        }

        RouteNetwork {
            tree: RTree::bulk_load(segments),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.tree.size()
    }

    /// Planar distance from `point` to the closest point of the network,
    /// NaN for an empty network
    pub fn distance_to(&self, point: &Point<f64>) -> f64 {
        let query = [point.x(), point.y()];
        self.tree
            .nearest_neighbor(&query)
            .map(|segment| segment.distance_2(&query).sqrt())
            .unwrap_or(f64::NAN)
    }
}

/// Per-building distance to the nearest route, in collection order
pub fn nearest_route_distances(
    buildings: &BuildingCollection,
    routes: &RouteCollection,
) -> Vec<f64> {
    if buildings.is_empty() {
        return Vec::new();
    }

    let network = RouteNetwork::from_routes(routes);
    buildings.points().map(|p| network.distance_to(p)).collect()
}

/// Copy of `buildings` with the `nearest_route_m` column attached
///
/// Geometry is never touched. An empty collection comes back empty with an
/// empty column; an empty route set gives NaN for every building.
pub fn nearest_route_distance(
    buildings: &BuildingCollection,
    routes: &RouteCollection,
) -> BuildingCollection {
    buildings.with_nearest_route_m(nearest_route_distances(buildings, routes))
}

/// Mean of the attached `nearest_route_m` column
///
/// NaN when the collection is empty or the column has not been computed.
pub fn mean_nearest_distance(buildings: &BuildingCollection) -> f64 {
    buildings
        .nearest_route_m()
        .map(mean)
        .unwrap_or(f64::NAN)
}
