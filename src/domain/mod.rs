pub mod errors;
pub mod generator;
pub mod metric;
pub mod repositories;
