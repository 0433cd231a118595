use crate::db::repo::{GameRepo, PlayerRepo};
use crate::error::{AppResult, DomainError};
use crate::models::board::Strike;
use crate::models::game::{Game, GameResult, Seat};
use crate::models::message::{Move, Notice};
use crate::models::player::Player;
use crate::models::types::{GameId, PlayerId};
use crate::net::output::{CLOSE_NORMAL, OutputHandle};
use crate::state::connections::ConnectionRegistry;
use crate::state::games::GameRegistry;
use std::sync::Arc;

/// A connected player's place in a live game. Owned by the connection task until it leaves.
#[derive(Debug, Clone)]
pub struct Participant {
    pub game_id: GameId,
    pub seat: Seat,
    pub player: Player,
    pub opponent_id: PlayerId,
    pub opponent_name: String,
    output: OutputHandle,
}

impl Participant {
    pub fn output(&self) -> &OutputHandle {
        &self.output
    }
}

/// Whether the connection loop should keep reading frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Move refused; the sender has been told why
    Rejected,
    Miss,
    Hit,
    Sunk,
    Won,
    /// The game was decided before this move
    Decided,
}

pub struct PlayService {
    games_repo: Arc<dyn GameRepo>,
    players_repo: Arc<dyn PlayerRepo>,
    connections: Arc<ConnectionRegistry>,
    games: Arc<GameRegistry>,
}

impl PlayService {
    pub fn new(
        games_repo: Arc<dyn GameRepo>,
        players_repo: Arc<dyn PlayerRepo>,
        connections: Arc<ConnectionRegistry>,
        games: Arc<GameRegistry>,
    ) -> Self {
        Self {
            games_repo,
            players_repo,
            connections,
            games,
        }
    }

    /// Live copy first, storage otherwise. Decided games cannot be joined.
    async fn resolve(&self, game_id: GameId) -> AppResult<Game> {
        let game = match self.games.get(game_id) {
            Some(game) => game,
            None => self
                .games_repo
                .load_game(game_id)
                .await?
                .ok_or(DomainError::GameNotFound)?,
        };

        if game.is_finished() {
            return Err(DomainError::GameNotFound);
        }
        Ok(game)
    }

    /// Admits `player` into the game and registers `output` as their only live channel.
    ///
    /// The slot is claimed first and only becomes visible to the opponent once the player is
    /// stored as unavailable and the game is live, so a refused join leaves no trace.
    pub async fn join(&self, game_id: GameId, mut player: Player, output: OutputHandle) -> AppResult<Participant> {
        if !self.connections.connect(player.id, output.clone()) {
            return Err(DomainError::AlreadyConnected);
        }

        let mut marked = false;
        let joined = loop {
            self.games.wait_flushed(game_id).await;

            let game = match self.resolve(game_id).await {
                Ok(game) => game,
                Err(e) => break Err(e),
            };
            let Some(seat) = game.seat_of(player.id) else {
                break Err(DomainError::NotParticipant);
            };

            if !marked {
                player.available = false;
                if let Err(e) = self.players_repo.save_player(&player).await {
                    break Err(e.into());
                }
                marked = true;
            }

            let me = Participant {
                game_id,
                seat,
                opponent_id: game.player_id(seat.opponent()),
                opponent_name: game.player_name(seat.opponent()).to_string(),
                player: player.clone(),
                output: output.clone(),
            };
            if self.games.enter(game, |live| self.announce(&me, live)).is_some() {
                break Ok(me);
            }
            // Taken for flushing since the lookup; wait for the stored state and look again.
        };

        let me = match joined {
            Ok(me) => me,
            Err(e) => {
                tracing::debug!(%game_id, player = %player.username, error = %e, "join refused");
                self.connections.disconnect(player.id);
                if marked {
                    player.available = true;
                    if let Err(e) = self.players_repo.save_player(&player).await {
                        tracing::warn!(player = %player.username, error = %e, "failed to restore availability");
                    }
                }
                return Err(e);
            }
        };
        tracing::info!(%game_id, player = %me.player.username, "player joined game");
        Ok(me)
    }

    /// Publishes the player's slot and greets both sides. Runs under the game registry lock.
    fn announce(&self, me: &Participant, game: &mut Game) {
        self.connections.publish(me.player.id);
        self.broadcast(
            me,
            Notice::Connected {
                player: me.player.username.clone(),
            },
        );

        if self.connections.is_present(me.opponent_id) {
            let next = game.next_turn.clone().unwrap_or_default();
            let notice = if game.result == GameResult::NotStarted {
                game.result = GameResult::NotEnded;
                Notice::Started { next }
            } else {
                Notice::Continued { next }
            };
            self.broadcast(me, notice);
        }
    }

    /// Handles one inbound frame from `me`.
    pub async fn handle_frame(&self, me: &Participant, text: &str) -> AppResult<Flow> {
        let Some(mv) = Move::parse(text) else {
            me.output.message(Notice::Invalid);
            return Ok(Flow::Continue);
        };

        let cell = mv.cell.id();
        let Some(outcome) = self.games.with_game(me.game_id, |game| self.resolve_move(me, game, &cell)) else {
            // Game was decided and flushed in the meantime
            return Ok(Flow::Finished);
        };
        tracing::debug!(game_id = %me.game_id, player = %me.player.username, %cell, ?outcome, "move");

        match outcome {
            Outcome::Won => {
                self.finish(me).await?;
                Ok(Flow::Finished)
            }
            Outcome::Decided => Ok(Flow::Finished),
            _ => Ok(Flow::Continue),
        }
    }

    /// Validates and applies a move. Runs under the game registry lock, so the presence and turn
    /// checks, the board mutation, the broadcasts and the turn flip form a single step.
    fn resolve_move(&self, me: &Participant, game: &mut Game, cell: &str) -> Outcome {
        let name = me.player.username.as_str();

        if game.is_finished() {
            return Outcome::Decided;
        }

        if !self.connections.is_present(me.opponent_id) {
            me.output.message(Notice::Paused);
            return Outcome::Rejected;
        }

        if !game.is_turn_of(name) {
            me.output.message(Notice::NotYourTurn {
                next: game.next_turn.clone().unwrap_or_default(),
            });
            return Outcome::Rejected;
        }

        let target = me.seat.opponent();
        let strike = game.board_mut(target).strike(cell);
        if strike == Strike::Repeat {
            me.output.message(Notice::AlreadyAttacked { cell: cell.to_string() });
            return Outcome::Rejected;
        }

        self.broadcast(
            me,
            Notice::Moved {
                player: name.to_string(),
                cell: cell.to_string(),
            },
        );

        match strike {
            Strike::Miss => {
                self.broadcast(
                    me,
                    Notice::Miss {
                        player: name.to_string(),
                        next: me.opponent_name.clone(),
                    },
                );
                game.next_turn = Some(me.opponent_name.clone());
                Outcome::Miss
            }
            Strike::Hit(_) => {
                self.broadcast(me, Notice::Hit { player: name.to_string() });
                Outcome::Hit
            }
            Strike::Sunk(_) => {
                self.broadcast(me, Notice::Sunk { player: name.to_string() });
                if game.board(target).is_defeated() {
                    self.broadcast(me, Notice::Win { player: name.to_string() });
                    Outcome::Won
                } else {
                    Outcome::Sunk
                }
            }
            Strike::Repeat => Outcome::Rejected,
        }
    }

    /// Records the win, hands the final state to storage and closes both connections. When the
    /// store fails the decided game stays live and the last player out retries it.
    async fn finish(&self, me: &Participant) -> AppResult<()> {
        self.games.set_result(me.game_id, me.seat);
        self.games
            .with_game(me.game_id, |game| game.board_mut(me.seat.opponent()).clear());

        let stored = self.flush(me.game_id, || true).await;
        tracing::info!(game_id = %me.game_id, winner = %me.player.username, "game finished");

        self.connections.close(me.opponent_id, CLOSE_NORMAL, "");
        me.output.close(CLOSE_NORMAL, "");

        stored.map(|_| ())
    }

    /// Tears down a connection. Runs on every exit path of the connection loop.
    pub async fn leave(&self, me: &Participant) -> AppResult<()> {
        let mut player = me.player.clone();
        player.available = true;
        let flagged = self.players_repo.save_player(&player).await;
        if let Err(e) = &flagged {
            tracing::error!(player = %player.username, error = %e, "failed to store availability");
        }

        // Under the game lock, so a move in flight sees either both players or a paused game.
        if self
            .games
            .with_game(me.game_id, |_| self.connections.disconnect(me.player.id))
            .is_none()
        {
            self.connections.disconnect(me.player.id);
        }

        // Whoever leaves last stores the game, exactly once.
        let flushed = self
            .flush(me.game_id, || !self.connections.is_present(me.opponent_id))
            .await;

        self.connections.send_to(
            me.opponent_id,
            Notice::Disconnected {
                player: me.player.username.clone(),
            },
        );
        tracing::info!(game_id = %me.game_id, player = %me.player.username, "player left game");

        flagged?;
        flushed?;
        Ok(())
    }

    /// Stores the live game if `idle` holds, keeping it in the registry until the write lands.
    /// Returns whether a snapshot was stored.
    async fn flush(&self, game_id: GameId, idle: impl FnOnce() -> bool) -> AppResult<bool> {
        let Some(snapshot) = self.games.begin_flush(game_id, idle) else {
            return Ok(false);
        };

        let saved = self.games_repo.save_game(&snapshot).await;
        self.games.end_flush(game_id, saved.is_ok());
        match saved {
            Ok(()) => {
                tracing::info!(%game_id, result = ?snapshot.result, "game state stored");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(%game_id, error = %e, "failed to store game, keeping it live");
                Err(e.into())
            }
        }
    }

    fn broadcast(&self, me: &Participant, notice: Notice) {
        self.connections.send_to_both(notice, &me.output, me.opponent_id);
    }
}
