//! Share of buildings lying within a buffer distance of any route.

use geo::{BoundingRect, Buffer, Intersects, MultiPolygon, Point};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;

use crate::commons::basic_functions::percentage;
use crate::geometric::building::BuildingCollection;
use crate::geometric::route::RouteCollection;

/// Buffer distance used when none is configured, in meters
pub const DEFAULT_BUFFER_DISTANCE_M: f64 = 100.0;

/// One buffered polygon per route, in route order
///
/// A distance <= 0 is handed to the buffer primitive as is; it yields an empty
/// polygon for lines, which simply never matches a building.
pub fn buffer_routes(routes: &RouteCollection, distance_m: f64) -> Vec<MultiPolygon<f64>> {
    routes
        .iter()
        .map(|route| route.geometry.buffer(distance_m))
        .collect()
}

type BufferEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Envelope index over a set of buffered polygons
///
/// Testing a point against the index is equivalent to testing it against the
/// union of the polygons: a point intersects the union iff it intersects at
/// least one member, so no merged geometry has to be built.
pub struct BufferIndex<'a> {
    polygons: &'a [MultiPolygon<f64>],
    tree: RTree<BufferEnvelope>,
}

impl<'a> BufferIndex<'a> {
    pub fn new(polygons: &'a [MultiPolygon<f64>]) -> Self {
        let envelopes: Vec<BufferEnvelope> = polygons
            .iter()
            .enumerate()
            .filter_map(|(idx, polygon)| {
                let rect = polygon.bounding_rect()?;
                Some(GeomWithData::new(
                    Rectangle::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    idx,
                ))
            })
            .collect();

        BufferIndex {
            polygons,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Whether `point` intersects (boundary included) any buffered polygon
    pub fn intersects(&self, point: &Point<f64>) -> bool {
        self.tree
            .locate_all_at_point(&[point.x(), point.y()])
            .any(|candidate| self.polygons[candidate.data].intersects(point))
    }
}

/// Percentage (0-100) of buildings intersecting the union of `buffered`
///
/// Each building is counted at most once, however many buffers it falls in.
/// Returns NaN for an empty building collection: there is nothing to measure,
/// which is not the same as "no building is near a route".
pub fn buildings_near_routes(
    buildings: &BuildingCollection,
    buffered: &[MultiPolygon<f64>],
) -> f64 {
    if buildings.is_empty() {
        return f64::NAN;
    }

    let index = BufferIndex::new(buffered);
    let near = buildings.points().filter(|p| index.intersects(p)).count();

    percentage(near, buildings.len())
}
