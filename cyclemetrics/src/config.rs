use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collect::global_variables::{
    get_data_path, DEFAULT_ADMIN_FILE, DEFAULT_BUILDINGS_FILE, DEFAULT_ROUTES_FILE,
    DEFAULT_TARGET_EPSG,
};
use crate::metrics::proximity::DEFAULT_BUFFER_DISTANCE_M;

/// Settings shared by the CLI and the REST endpoint
///
/// Every field has a default, so a JSON file only needs the keys it overrides:
///
/// ```json
/// { "data_dir": "/srv/enschede", "buffer_distance_m": 250.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory the default file names are resolved against
    pub data_dir: PathBuf,
    pub routes_file: String,
    pub buildings_file: String,
    pub admin_file: String,
    /// Planar CRS every collection is reprojected into before analysis
    pub target_epsg: i32,
    /// Forces the CRS of input files, ignoring any `crs` member they carry
    pub source_epsg: Option<i32>,
    pub buffer_distance_m: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            data_dir: get_data_path(),
            routes_file: DEFAULT_ROUTES_FILE.to_string(),
            buildings_file: DEFAULT_BUILDINGS_FILE.to_string(),
            admin_file: DEFAULT_ADMIN_FILE.to_string(),
            target_epsg: DEFAULT_TARGET_EPSG,
            source_epsg: None,
            buffer_distance_m: DEFAULT_BUFFER_DISTANCE_M,
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn default_routes_path(&self) -> PathBuf {
        self.data_dir.join(&self.routes_file)
    }

    pub fn default_buildings_path(&self) -> PathBuf {
        self.data_dir.join(&self.buildings_file)
    }

    pub fn default_admin_path(&self) -> PathBuf {
        self.data_dir.join(&self.admin_file)
    }

    /// Explicit path if given and non-empty, the configured default otherwise
    pub fn resolve_routes_path(&self, explicit: Option<&str>) -> PathBuf {
        resolve_path(explicit, || self.default_routes_path())
    }

    pub fn resolve_buildings_path(&self, explicit: Option<&str>) -> PathBuf {
        resolve_path(explicit, || self.default_buildings_path())
    }

    pub fn resolve_admin_path(&self, explicit: Option<&str>) -> PathBuf {
        resolve_path(explicit, || self.default_admin_path())
    }
}

fn resolve_path(explicit: Option<&str>, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match explicit {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default(),
    }
}
