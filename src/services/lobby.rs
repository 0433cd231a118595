use crate::db::repo::{GameRepo, PlayerRepo};
use crate::error::{AppResult, DomainError};
use crate::models::game::{Game, GameView};
use crate::models::player::{Player, PlayerPublic};
use crate::services::board::generate_board;
use crate::state::games::GameRegistry;
use std::sync::Arc;

pub struct LobbyService {
    games_repo: Arc<dyn GameRepo>,
    players_repo: Arc<dyn PlayerRepo>,
    games: Arc<GameRegistry>,
}

impl LobbyService {
    pub fn new(games_repo: Arc<dyn GameRepo>, players_repo: Arc<dyn PlayerRepo>, games: Arc<GameRegistry>) -> Self {
        Self {
            games_repo,
            players_repo,
            games,
        }
    }

    /// Opens a new game between `player1` and the player named `player2_name`, each with a
    /// freshly generated board. The view returned carries the creator's board.
    pub async fn create_game(&self, player1: &Player, player2_name: &str) -> AppResult<GameView> {
        if player1.username == player2_name {
            return Err(DomainError::Validation {
                field: "player2-name",
                message: "cannot start a game against yourself".into(),
            });
        }

        let Some(player2) = self.players_repo.get_by_username(player2_name).await? else {
            return Err(DomainError::NotFound(format!("User with name \"{player2_name}\" not found.")));
        };

        let game = Game::new(
            (player1.id, player1.username.as_str()),
            (player2.id, player2.username.as_str()),
            generate_board(),
            generate_board(),
        );
        self.games_repo.insert_game(&game).await?;
        tracing::info!(game_id = %game.id, player1 = %player1.username, player2 = %player2.username, "game created");

        Ok(GameView::for_player(&game, player1.id))
    }

    /// Unfinished games of `player` with their own board. Games with a live connection are
    /// reported from memory, which is ahead of storage while play is in progress.
    pub async fn active_games(&self, player: &Player) -> AppResult<Vec<GameView>> {
        let stored = self.games_repo.list_for_player(player.id, false).await?;

        Ok(stored
            .into_iter()
            .map(|game| self.games.get(game.id).unwrap_or(game))
            .filter(|game| !game.is_finished())
            .map(|game| GameView::for_player(&game, player.id))
            .collect())
    }

    /// Finished games of the player called `username`.
    pub async fn stats(&self, username: &str) -> AppResult<Vec<GameView>> {
        let Some(player) = self.players_repo.get_by_username(username).await? else {
            return Err(DomainError::NotFound(format!("Player with name \"{username}\" not found.")));
        };

        let games = self.games_repo.list_for_player(player.id, true).await?;
        Ok(games.iter().map(GameView::summary).collect())
    }

    pub async fn available_players(&self, except: &Player) -> AppResult<Vec<PlayerPublic>> {
        let players = self.players_repo.list_available(except.id).await?;
        Ok(players.iter().map(PlayerPublic::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::MemoryStore;
    use crate::models::game::{GameResult, Seat};

    struct Fixture {
        store: Arc<MemoryStore>,
        games: Arc<GameRegistry>,
        lobby: LobbyService,
        alice: Player,
        bob: Player,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let games = Arc::new(GameRegistry::new());
        let lobby = LobbyService::new(store.clone(), store.clone(), games.clone());
        let alice = store.insert_player(Player::new("alice", "x".into())).await.unwrap();
        let bob = store.insert_player(Player::new("bob", "x".into())).await.unwrap();
        Fixture {
            store,
            games,
            lobby,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn create_game_hands_back_the_creators_board() {
        let f = fixture().await;
        let view = f.lobby.create_game(&f.alice, "bob").await.unwrap();

        assert_eq!(view.result, GameResult::NotStarted);
        assert_eq!(view.player1_name, "alice");
        assert_eq!(view.player2_name, "bob");

        let stored = f.store.load_game(view.sid).await.unwrap().unwrap();
        assert_eq!(view.player_lived_board.as_ref(), Some(stored.board(Seat::Player1)));
        assert_eq!(stored.board(Seat::Player2).ships.len(), 10);
        assert!(stored.next_turn.is_none());
    }

    #[tokio::test]
    async fn create_game_rejects_unknown_and_self() {
        let f = fixture().await;
        let err = f.lobby.create_game(&f.alice, "carol").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(ref m) if m == "User with name \"carol\" not found."));

        let err = f.lobby.create_game(&f.alice, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn active_games_prefer_the_live_copy() {
        let f = fixture().await;
        let view = f.lobby.create_game(&f.alice, "bob").await.unwrap();

        let mut live = f.store.load_game(view.sid).await.unwrap().unwrap();
        live.result = GameResult::NotEnded;
        live.board_mut(Seat::Player2).attacked.push("a1".into());
        f.games.add(live);

        let games = f.lobby.active_games(&f.bob).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].result, GameResult::NotEnded);
        let board = games[0].player_lived_board.as_ref().unwrap();
        assert_eq!(board.attacked, vec!["a1".to_string()]);
    }

    #[tokio::test]
    async fn stats_list_finished_games_only() {
        let f = fixture().await;
        let won = f.lobby.create_game(&f.alice, "bob").await.unwrap();
        f.lobby.create_game(&f.bob, "alice").await.unwrap();

        let mut game = f.store.load_game(won.sid).await.unwrap().unwrap();
        game.result = GameResult::Player1Win;
        f.store.save_game(&game).await.unwrap();

        let stats = f.lobby.stats("bob").await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].sid, won.sid);
        assert!(stats[0].player_lived_board.is_none());
        assert_eq!(f.lobby.active_games(&f.alice).await.unwrap().len(), 1);

        assert!(matches!(f.lobby.stats("carol").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn available_players_exclude_the_caller_and_busy_players() {
        let f = fixture().await;
        let mut carol = f.store.insert_player(Player::new("carol", "x".into())).await.unwrap();
        carol.available = false;
        f.store.save_player(&carol).await.unwrap();

        let players = f.lobby.available_players(&f.alice).await.unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["bob"]);
        assert_eq!(players[0].id, f.bob.id);
    }
}
