pub mod building;
pub mod region;
pub mod route;
