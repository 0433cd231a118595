use crate::db::DbResult;
use crate::models::game::Game;
use crate::models::types::{GameId, PlayerId};

#[async_trait::async_trait]
pub trait GameRepo: Send + Sync {
    /// Stores a freshly created game together with both boards
    async fn insert_game(&self, game: &Game) -> DbResult<()>;

    /// Loads a game with both boards attached
    async fn load_game(&self, game_id: GameId) -> DbResult<Option<Game>>;

    /// Writes back the whole state of a game (result, turn, end date and boards)
    async fn save_game(&self, game: &Game) -> DbResult<()>;

    /// Games a player takes part in, either the finished or the unfinished ones
    async fn list_for_player(&self, player_id: PlayerId, finished: bool) -> DbResult<Vec<Game>>;
}
