use geo::{Euclidean, Length, MultiLineString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single route (cycle path, road segment) in a planar CRS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Route geometry; plain `LineString` features load as a one-part multi line
    pub geometry: MultiLineString<f64>,
    /// GeoJSON properties carried over from the source feature
    pub properties: Map<String, Value>,
}

impl Route {
    pub fn new(geometry: MultiLineString<f64>) -> Self {
        Route {
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_properties(geometry: MultiLineString<f64>, properties: Map<String, Value>) -> Self {
        Route {
            geometry,
            properties,
        }
    }

    /// Planar length in CRS units (meters)
    pub fn length(&self) -> f64 {
        planar_length(&self.geometry)
    }
}

/// Euclidean length of all parts of a multi line string
pub fn planar_length(geometry: &MultiLineString<f64>) -> f64 {
    geometry.iter().map(|ls| Euclidean.length(ls)).sum()
}

/// Ordered, read-only collection of routes sharing one CRS
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
    epsg: Option<i32>,
}

impl RouteCollection {
    pub fn new(routes: Vec<Route>, epsg: Option<i32>) -> Self {
        RouteCollection { routes, epsg }
    }

    /// Build a collection from bare geometries (tests, synthetic inputs)
    pub fn from_geometries<I>(geometries: I, epsg: Option<i32>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MultiLineString<f64>>,
    {
        let routes = geometries
            .into_iter()
            .map(|g| Route::new(g.into()))
            .collect();
        RouteCollection { routes, epsg }
    }

    pub fn epsg(&self) -> Option<i32> {
        self.epsg
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Total planar length in meters
    pub fn total_length(&self) -> f64 {
        self.routes.iter().map(Route::length).sum()
    }
}

impl<'a> IntoIterator for &'a RouteCollection {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
