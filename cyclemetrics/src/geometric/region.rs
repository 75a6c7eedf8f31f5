use geo::{Area, MultiPolygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::commons::basic_functions::m2_to_km2;

/// A named administrative region (municipality, district, neighbourhood)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Key of the output table
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// Remaining GeoJSON properties, joined back onto the metrics table
    pub properties: Map<String, Value>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        Region {
            name: name.into(),
            geometry: geometry.into(),
            properties: Map::new(),
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Planar area in square meters
    pub fn area_m2(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    pub fn area_km2(&self) -> f64 {
        m2_to_km2(self.area_m2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_region_area() {
        let region = Region::new(
            "Centrum",
            polygon![
                (x: 0.0, y: 0.0),
                (x: 2000.0, y: 0.0),
                (x: 2000.0, y: 1000.0),
                (x: 0.0, y: 1000.0),
                (x: 0.0, y: 0.0),
            ],
        );
        assert_eq!(region.name, "Centrum");
        assert!((region.area_m2() - 2_000_000.0).abs() < 1e-6);
        assert!((region.area_km2() - 2.0).abs() < 1e-12);
    }
}
