pub mod collect;
pub mod commons;
pub mod config;
pub mod error;
pub mod geo_core;
pub mod geometric;
pub mod metrics;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use error::CycleMetricsError;
pub use geometric::building::{Building, BuildingCollection};
pub use geometric::region::Region;
pub use geometric::route::{Route, RouteCollection};
pub use metrics::{analyze_study_area, MetricsResult, RegionMetrics, StudyAreaAnalysis};
