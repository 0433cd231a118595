pub mod connections;
pub mod games;
pub mod registry;
