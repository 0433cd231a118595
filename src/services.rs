mod auth;
pub mod board;
mod lobby;
mod play;

pub use auth::{AuthService, TokenPair};
pub use lobby::LobbyService;
pub use play::{Flow, Participant, PlayService};
