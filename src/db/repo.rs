mod game;
mod game_db;
mod memory;
mod player;
mod player_db;

pub use game_db::GameRepository;
pub use memory::MemoryStore;
pub use player_db::PlayerRepository;

pub use game::GameRepo;
pub use player::PlayerRepo;
