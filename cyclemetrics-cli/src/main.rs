//! `cyclemetrics` command-line interface
//!
//! Computes the cycling-friendliness metrics of a study area or of every
//! administrative region, filters bike-only road segments, and serves the
//! metrics over HTTP.

mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyclemetrics::collect::bike_filter::geojson_to_bike_geojson;
use cyclemetrics::pipeline::{analyze_files, analyze_region_files};
use cyclemetrics::AnalysisConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Cycling-friendliness metrics for route networks")]
struct Cli {
    /// JSON file with analysis settings (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Whole-area metrics for one route layer and one building layer
    Metrics {
        #[command(flatten)]
        inputs: InputArgs,

        /// Write the buildings with their nearest route distance to this GeoJSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Metrics per administrative region, joined onto the region table
    Regions {
        #[command(flatten)]
        inputs: InputArgs,

        /// Administrative regions GeoJSON (polygons with a `name` property)
        #[arg(long)]
        admin_fp: Option<String>,
    },
    /// Keep only the bicycle-only segments of a road network
    FilterBike {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
    /// Serve the metrics endpoint over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Debug, clap::Args)]
struct InputArgs {
    /// Route network GeoJSON
    #[arg(long)]
    routes_fp: Option<String>,

    /// Buildings GeoJSON (points or footprints)
    #[arg(long)]
    buildings_fp: Option<String>,

    /// Buffer distance in meters for the proximity metric
    #[arg(long)]
    buffer_m: Option<f64>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::from_json_file(p),
        None => Ok(AnalysisConfig::default()),
    }
}

fn apply_buffer(config: &mut AnalysisConfig, buffer_m: Option<f64>) {
    if let Some(buffer) = buffer_m {
        config.buffer_distance_m = buffer;
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.3}", value)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Metrics { inputs, output } => {
            apply_buffer(&mut config, inputs.buffer_m);
            let routes = config.resolve_routes_path(inputs.routes_fp.as_deref());
            let buildings = config.resolve_buildings_path(inputs.buildings_fp.as_deref());

            let analysis = tokio::task::spawn_blocking(move || {
                analyze_files(&routes, &buildings, &config)
            })
            .await
            .context("Analysis task failed")??;

            for (name, value) in analysis.metrics.fields() {
                println!("{:<28} {}", name, format_value(value));
            }

            if let Some(path) = output {
                analysis.buildings.to_geojson(&path)?;
            }
        }
        Command::Regions { inputs, admin_fp } => {
            apply_buffer(&mut config, inputs.buffer_m);
            let routes = config.resolve_routes_path(inputs.routes_fp.as_deref());
            let buildings = config.resolve_buildings_path(inputs.buildings_fp.as_deref());
            let admin = config.resolve_admin_path(admin_fp.as_deref());

            let analysis = tokio::task::spawn_blocking(move || {
                analyze_region_files(&routes, &buildings, &admin, &config)
            })
            .await
            .context("Region analysis task failed")??;

            println!("{}", analysis.joined);
        }
        Command::FilterBike { input, output } => {
            let summary = geojson_to_bike_geojson(&input, &output)?;
            println!("{} → {} bike-only segments", summary.total, summary.kept);
        }
        Command::Serve { host, port } => {
            server::run(config, &host, port).await?;
        }
    }

    Ok(())
}
