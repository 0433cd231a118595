pub mod board;
pub mod cell;
pub mod game;
pub mod message;
pub mod player;
pub mod ship;
pub mod types;
