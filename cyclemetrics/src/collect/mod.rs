pub mod bike_filter;
pub mod global_variables;
pub mod loader;
