pub mod persistence;
pub mod repositories;
pub mod seed;
