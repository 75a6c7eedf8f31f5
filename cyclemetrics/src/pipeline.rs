//! File-level entry points shared by the CLI and the REST endpoint.

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use std::path::Path;

use crate::collect::loader::{ensure_exists, load_data, load_regions};
use crate::config::AnalysisConfig;
use crate::metrics::administrative::{
    analyze_by_admin_region, join_metrics_to_regions, region_metrics_to_polars_df,
};
use crate::metrics::{analyze_study_area, RegionMetrics, StudyAreaAnalysis, StudyAreaOptions};

/// Load both layers and run the whole-area analysis
pub fn analyze_files(
    routes_path: &Path,
    buildings_path: &Path,
    config: &AnalysisConfig,
) -> Result<StudyAreaAnalysis> {
    let (routes, buildings) = load_data(routes_path, buildings_path, config)?;

    let options = StudyAreaOptions {
        buffer_distance_m: config.buffer_distance_m,
        study_area: None,
    };
    let analysis = analyze_study_area(&routes, &buildings, &options);

    tracing::info!(
        routes = routes.len(),
        buildings = buildings.len(),
        pct_near = analysis.metrics.pct_buildings_near_route,
        avg_distance_m = analysis.metrics.avg_distance_to_route_m,
        density = analysis.metrics.route_density_km_per_km2,
        "Study area analysed"
    );
    Ok(analysis)
}

/// Per-region metrics, as rows and joined onto the region table
#[derive(Debug, Clone)]
pub struct RegionAnalysis {
    pub rows: Vec<RegionMetrics>,
    /// `region_name` plus the three metrics, one row per analysed region
    pub table: DataFrame,
    /// Every region with its properties, metrics null where skipped
    pub joined: DataFrame,
}

/// Load the three layers and run the region aggregator
pub fn analyze_region_files(
    routes_path: &Path,
    buildings_path: &Path,
    admin_path: &Path,
    config: &AnalysisConfig,
) -> Result<RegionAnalysis> {
    ensure_exists(admin_path)?;
    let (routes, buildings) = load_data(routes_path, buildings_path, config)?;
    let regions = load_regions(admin_path, config)?;

    let rows = analyze_by_admin_region(&routes, &buildings, &regions, config.buffer_distance_m);
    let table = region_metrics_to_polars_df(&rows).context("Failed to build region table")?;
    let joined = join_metrics_to_regions(&regions, &table)
        .context("Failed to join region metrics")?;

    Ok(RegionAnalysis {
        rows,
        table,
        joined,
    })
}
