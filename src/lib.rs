pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod services;
pub mod state;

// Convenient re-exports (so call sites can do `seabattle::Registry`, etc.)
pub use services::board::generate_board;
pub use state::{
    connections::ConnectionRegistry,
    games::GameRegistry,
    registry::Registry,
};
