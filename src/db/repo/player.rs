use crate::db::DbResult;
use crate::models::player::Player;
use crate::models::types::PlayerId;

#[async_trait::async_trait]
pub trait PlayerRepo: Send + Sync {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<Player>>;
    async fn get_by_id(&self, player_id: PlayerId) -> DbResult<Option<Player>>;

    /// Inserts a new player. Fails with `DbError::UniqueViolation` when the username is taken.
    async fn insert_player(&self, player: Player) -> DbResult<Player>;

    /// Persists the mutable fields of an existing player (availability flag).
    async fn save_player(&self, player: &Player) -> DbResult<()>;

    /// Players not currently connected to any game, excluding `except`.
    async fn list_available(&self, except: PlayerId) -> DbResult<Vec<Player>>;
}
