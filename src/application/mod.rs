pub mod broadcaster;
pub mod registry;
pub mod system;
