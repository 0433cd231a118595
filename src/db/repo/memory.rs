use crate::db::error::DbError;
use crate::db::repo::{GameRepo, PlayerRepo};
use crate::db::DbResult;
use crate::models::game::Game;
use crate::models::player::Player;
use crate::models::types::{GameId, PlayerId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ephemeral storage for players and games. Used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    players: DashMap<PlayerId, Player>,
    games: DashMap<GameId, Game>,
    game_saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_game` calls served so far.
    pub fn game_saves(&self) -> usize {
        self.game_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayerRepo for MemoryStore {
    async fn get_by_username(&self, username: &str) -> DbResult<Option<Player>> {
        Ok(self
            .players
            .iter()
            .find(|p| p.username == username)
            .map(|p| p.value().clone()))
    }

    async fn get_by_id(&self, player_id: PlayerId) -> DbResult<Option<Player>> {
        Ok(self.players.get(&player_id).map(|p| p.value().clone()))
    }

    async fn insert_player(&self, player: Player) -> DbResult<Player> {
        if self.players.iter().any(|p| p.username == player.username) {
            return Err(DbError::UniqueViolation);
        }
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn save_player(&self, player: &Player) -> DbResult<()> {
        let Some(mut stored) = self.players.get_mut(&player.id) else {
            return Err(DbError::NotFound);
        };
        stored.available = player.available;
        Ok(())
    }

    async fn list_available(&self, except: PlayerId) -> DbResult<Vec<Player>> {
        let mut players: Vec<Player> = self
            .players
            .iter()
            .filter(|p| p.available && p.id != except)
            .map(|p| p.value().clone())
            .collect();
        players.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(players)
    }
}

#[async_trait]
impl GameRepo for MemoryStore {
    async fn insert_game(&self, game: &Game) -> DbResult<()> {
        if self.games.contains_key(&game.id) {
            return Err(DbError::UniqueViolation);
        }
        self.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn load_game(&self, game_id: GameId) -> DbResult<Option<Game>> {
        Ok(self.games.get(&game_id).map(|g| g.value().clone()))
    }

    async fn save_game(&self, game: &Game) -> DbResult<()> {
        let Some(mut stored) = self.games.get_mut(&game.id) else {
            return Err(DbError::NotFound);
        };
        *stored = game.clone();
        self.game_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_for_player(&self, player_id: PlayerId, finished: bool) -> DbResult<Vec<Game>> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.seat_of(player_id).is_some() && g.is_finished() == finished)
            .map(|g| g.value().clone())
            .collect();
        games.sort_by_key(|g| g.created_at);
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::board::Board;
    use crate::models::game::GameResult;

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.insert_player(Player::new("alice", "h".into())).await.unwrap();
        let err = store.insert_player(Player::new("alice", "h".into())).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation));
    }

    #[tokio::test]
    async fn lists_only_available_others() {
        let store = MemoryStore::new();
        let alice = store.insert_player(Player::new("alice", "h".into())).await.unwrap();
        let mut bob = store.insert_player(Player::new("bob", "h".into())).await.unwrap();
        store.insert_player(Player::new("carol", "h".into())).await.unwrap();

        bob.available = false;
        store.save_player(&bob).await.unwrap();

        let names: Vec<String> = store
            .list_available(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.username)
            .collect();
        assert_eq!(names, vec!["carol".to_string()]);
    }

    #[tokio::test]
    async fn splits_finished_and_unfinished_games() {
        let store = MemoryStore::new();
        let alice = PlayerId::new();
        let bob = PlayerId::new();

        let open = Game::new((alice, "alice"), (bob, "bob"), Board::default(), Board::default());
        let mut done = Game::new((alice, "alice"), (bob, "bob"), Board::default(), Board::default());
        done.result = GameResult::Player2Win;

        store.insert_game(&open).await.unwrap();
        store.insert_game(&done).await.unwrap();

        let unfinished = store.list_for_player(alice, false).await.unwrap();
        let finished = store.list_for_player(bob, true).await.unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].id, open.id);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, done.id);
        assert!(store.list_for_player(PlayerId::new(), false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_counts_writes() {
        let store = MemoryStore::new();
        let game = Game::new((PlayerId::new(), "a"), (PlayerId::new(), "b"), Board::default(), Board::default());
        assert!(store.save_game(&game).await.is_err());
        store.insert_game(&game).await.unwrap();
        store.save_game(&game).await.unwrap();
        assert_eq!(store.game_saves(), 1);
    }
}
