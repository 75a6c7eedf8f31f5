use std::path::PathBuf;

pub const DATA_PATH: &str = "./data";

pub const DEFAULT_ROUTES_FILE: &str = "enschede_road_network.geojson";
pub const DEFAULT_BUILDINGS_FILE: &str = "enschede_buildings.geojson";
pub const DEFAULT_ADMIN_FILE: &str = "admin_regions.geojson";

/// Amersfoort / RD New, the planar CRS of the Enschede datasets
pub const DEFAULT_TARGET_EPSG: i32 = 28992;

/// RFC 7946 GeoJSON is always WGS84 unless a legacy `crs` member says otherwise
pub const GEOJSON_DEFAULT_EPSG: i32 = 4326;

pub fn get_data_path() -> PathBuf {
    PathBuf::from(DATA_PATH)
}
