use crate::models::game::{Game, Seat};
use crate::models::types::GameId;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::Notify;

struct LiveGame {
    game: Game,
    /// Set while a snapshot is on its way to storage. Nobody may join until it is cleared.
    flushing: bool,
}

/// Games that currently have at least one connected player.
#[derive(Default)]
pub struct GameRegistry {
    games: Mutex<HashMap<GameId, LiveGame>>,
    flushed: Notify,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a game live. See [`GameRegistry::enter`].
    pub fn add(&self, game: Game) -> bool {
        self.enter(game, |_| ()).is_some()
    }

    /// Makes a game live and runs `f` against the live copy under the registry lock. A game that
    /// is already live is left untouched. The first time a game becomes live without a turn
    /// pointer, the starting player is drawn at random. Returns None while the game is flushing.
    pub fn enter<R>(&self, game: Game, f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        let mut games = self.games.lock();
        let live = games.entry(game.id).or_insert(LiveGame { game, flushing: false });
        if live.flushing {
            return None;
        }

        if live.game.next_turn.is_none() {
            let seat = if rand::rng().random_bool(0.5) {
                Seat::Player1
            } else {
                Seat::Player2
            };
            live.game.next_turn = Some(live.game.player_name(seat).to_string());
        }
        Some(f(&mut live.game))
    }

    /// Marks the game as flushing and hands back a snapshot to store. Nothing happens, and None
    /// is returned, when the game is not live, is already flushing, or `idle` says no.
    pub fn begin_flush(&self, game_id: GameId, idle: impl FnOnce() -> bool) -> Option<Game> {
        let mut games = self.games.lock();
        let live = games.get_mut(&game_id).filter(|l| !l.flushing)?;
        if !idle() {
            return None;
        }
        live.flushing = true;
        Some(live.game.clone())
    }

    /// Ends a flush started by [`GameRegistry::begin_flush`]. A stored game leaves the registry;
    /// otherwise it stays live so the next flush retries it. Wakes every waiting join.
    pub fn end_flush(&self, game_id: GameId, stored: bool) {
        {
            let mut games = self.games.lock();
            if stored {
                games.remove(&game_id);
            } else if let Some(live) = games.get_mut(&game_id) {
                live.flushing = false;
            }
        }
        self.flushed.notify_waiters();
    }

    pub fn is_flushing(&self, game_id: GameId) -> bool {
        self.games.lock().get(&game_id).is_some_and(|l| l.flushing)
    }

    /// Resolves once the game is not flushing.
    pub async fn wait_flushed(&self, game_id: GameId) {
        loop {
            let mut flushed = std::pin::pin!(self.flushed.notified());
            flushed.as_mut().enable();
            if !self.is_flushing(game_id) {
                return;
            }
            flushed.await;
        }
    }

    pub fn get(&self, game_id: GameId) -> Option<Game> {
        self.games.lock().get(&game_id).map(|l| l.game.clone())
    }

    pub fn remove(&self, game_id: GameId) -> Option<Game> {
        self.games.lock().remove(&game_id).map(|l| l.game)
    }

    pub fn contains(&self, game_id: GameId) -> bool {
        self.games.lock().contains_key(&game_id)
    }

    /// Runs `f` against the live game while holding the registry lock.
    pub fn with_game<R>(&self, game_id: GameId, f: impl FnOnce(&mut Game) -> R) -> Option<R> {
        self.games.lock().get_mut(&game_id).map(|l| f(&mut l.game))
    }

    pub fn set_turn(&self, game_id: GameId, player_name: &str) {
        self.with_game(game_id, |g| g.next_turn = Some(player_name.to_string()));
    }

    pub fn get_turn(&self, game_id: GameId) -> Option<String> {
        self.with_game(game_id, |g| g.next_turn.clone()).flatten()
    }

    /// Stamps the end date and records `winner` as the winning side.
    pub fn set_result(&self, game_id: GameId, winner: Seat) {
        self.with_game(game_id, |g| {
            g.end_date = Some(Utc::now());
            g.result = winner.win_result();
        });
    }

    pub fn len(&self) -> usize {
        self.games.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.lock().is_empty()
    }
}
