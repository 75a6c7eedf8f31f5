use std::path::PathBuf;

use thiserror::Error;

/// Typed failures raised while turning files into geometry collections.
///
/// The metric engines themselves never fail: empty inputs map to NaN or to a
/// skipped region. These variants are wrapped into `anyhow::Error` by the
/// loaders and can be recovered with `downcast_ref` by callers that need to
/// tell a missing file apart from a broken one.
#[derive(Debug, Error)]
pub enum CycleMetricsError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid GeoJSON in {}: {message}", .path.display())]
    InvalidGeoJson { path: PathBuf, message: String },

    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("projection from EPSG:{from} to EPSG:{to} failed: {message}")]
    Projection { from: i32, to: i32, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CycleMetricsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CycleMetricsError::FileNotFound(_))
    }
}
