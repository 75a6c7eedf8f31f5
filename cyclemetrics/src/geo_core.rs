use anyhow::Result;
use geo::{Coord, Geometry, MapCoords};
#[cfg(feature = "proj")]
use proj::Proj;

use crate::collect::global_variables::DEFAULT_TARGET_EPSG;
use crate::error::CycleMetricsError;

/// CRS handling shared by every loader
///
/// Holds the planar target CRS that all collections are reprojected into, so
/// that lengths, areas and distances downstream are plain Euclidean values in
/// meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoCore {
    /// Target EPSG code
    pub epsg: i32,
}

impl Default for GeoCore {
    fn default() -> Self {
        GeoCore::new(DEFAULT_TARGET_EPSG)
    }
}

impl GeoCore {
    pub fn new(epsg: i32) -> Self {
        GeoCore { epsg }
    }

    pub fn get_epsg(&self) -> i32 {
        self.epsg
    }

    /// Build the reprojection from `from_epsg` into this CRS
    ///
    /// Identical codes give an identity projector and never touch PROJ.
    pub fn projector(&self, from_epsg: i32) -> Result<Projector> {
        if from_epsg == self.epsg {
            return Ok(Projector::Identity);
        }

        #[cfg(feature = "proj")]
        {
            Ok(Projector::Proj {
                proj: new_proj(from_epsg, self.epsg)?,
                from: from_epsg,
                to: self.epsg,
            })
        }

        #[cfg(not(feature = "proj"))]
        {
            Err(CycleMetricsError::UnsupportedCrs(format!(
                "EPSG:{} -> EPSG:{} needs the `proj` feature",
                from_epsg, self.epsg
            ))
            .into())
        }
    }
}

#[cfg(feature = "proj")]
fn new_proj(from_epsg: i32, to_epsg: i32) -> Result<Proj> {
    let from_crs = format!("EPSG:{}", from_epsg);
    let to_crs = format!("EPSG:{}", to_epsg);

    Proj::new_known_crs(&from_crs, &to_crs, None).map_err(|e| {
        CycleMetricsError::Projection {
            from: from_epsg,
            to: to_epsg,
            message: e.to_string(),
        }
        .into()
    })
}

/// A ready-to-use reprojection between two CRS
pub enum Projector {
    Identity,
    #[cfg(feature = "proj")]
    Proj { proj: Proj, from: i32, to: i32 },
}

impl Projector {
    pub fn is_identity(&self) -> bool {
        matches!(self, Projector::Identity)
    }

    pub fn apply(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        match self {
            Projector::Identity => Ok(geometry.clone()),
            #[cfg(feature = "proj")]
            Projector::Proj { proj, from, to } => {
                let projected = geometry.try_map_coords(|c: Coord<f64>| {
                    proj.convert((c.x, c.y))
                        .map(|(x, y)| Coord { x, y })
                })
                .map_err(|e| CycleMetricsError::Projection {
                    from: *from,
                    to: *to,
                    message: e.to_string(),
                })?;
                Ok(projected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    #[test]
    fn test_geo_core_default() {
        let gc = GeoCore::default();
        assert_eq!(gc.get_epsg(), 28992);
    }

    #[test]
    fn test_identity_projector() {
        let gc = GeoCore::new(28992);
        let projector = gc.projector(28992).unwrap();
        assert!(projector.is_identity());

        let geometry = Geometry::Point(point!(x: 257_000.0, y: 471_000.0));
        assert_eq!(projector.apply(&geometry).unwrap(), geometry);
    }

    #[cfg(feature = "proj")]
    #[test]
    fn test_projector_wgs84_to_rd() {
        // Needs PROJ data; only sanity-check the output when it is installed
        let Ok(projector) = GeoCore::default().projector(4326) else {
            return;
        };
        assert!(!projector.is_identity());

        let geometry = Geometry::Point(point!(x: 6.89, y: 52.22));
        if let Ok(Geometry::Point(p)) = projector.apply(&geometry) {
            let (x, y) = (p.x(), p.y());
            assert!(x.is_finite());
            assert!(y.is_finite());
            // Enschede lies roughly at RD (257 km, 471 km)
            assert!((x - 257_000.0).abs() < 5_000.0);
            assert!((y - 471_000.0).abs() < 5_000.0);
        }
    }

    #[cfg(not(feature = "proj"))]
    #[test]
    fn test_projector_without_proj() {
        let gc = GeoCore::new(28992);
        let err = gc.projector(4326).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<CycleMetricsError>(),
            Some(CycleMetricsError::UnsupportedCrs(_))
        ));
    }
}
