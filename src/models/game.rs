use crate::db::DbResult;
use crate::db::error::DbError;
use crate::models::board::Board;
use crate::models::types::{GameId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "not ended")]
    NotEnded,
    #[serde(rename = "player 1 win")]
    Player1Win,
    #[serde(rename = "player 2 win")]
    Player2Win,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::NotStarted => "not started",
            GameResult::NotEnded => "not ended",
            GameResult::Player1Win => "player 1 win",
            GameResult::Player2Win => "player 2 win",
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self, GameResult::Player1Win | GameResult::Player2Win)
    }
}

impl core::str::FromStr for GameResult {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not started" => Ok(GameResult::NotStarted),
            "not ended" => Ok(GameResult::NotEnded),
            "player 1 win" => Ok(GameResult::Player1Win),
            "player 2 win" => Ok(GameResult::Player2Win),
            _ => Err(DbError::Decode(format!("unknown game result '{s}'"))),
        }
    }
}

impl core::fmt::Display for GameResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two places at a game. Player 1 owns board 0, player 2 owns board 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Seat::Player1 => 0,
            Seat::Player2 => 1,
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Seat::Player1),
            1 => Some(Seat::Player2),
            _ => None,
        }
    }

    #[inline]
    pub fn opponent(&self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }

    /// Result recorded when the player in this seat wins.
    pub fn win_result(&self) -> GameResult {
        match self {
            Seat::Player1 => GameResult::Player1Win,
            Seat::Player2 => GameResult::Player2Win,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    pub player1_id: PlayerId,
    pub player1_name: String,
    pub player2_id: PlayerId,
    pub player2_name: String,
    pub result: GameResult,
    /// Username of the player whose move is currently valid
    pub next_turn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub boards: [Board; 2],
}

impl Game {
    pub fn new(
        player1: (PlayerId, &str),
        player2: (PlayerId, &str),
        player1_board: Board,
        player2_board: Board,
    ) -> Self {
        Self {
            id: GameId::new(),
            player1_id: player1.0,
            player1_name: player1.1.to_string(),
            player2_id: player2.0,
            player2_name: player2.1.to_string(),
            result: GameResult::NotStarted,
            next_turn: None,
            created_at: Utc::now(),
            end_date: None,
            boards: [player1_board, player2_board],
        }
    }

    /// Builds a game from a `games` row and its two boards (player 1 first).
    pub fn try_from_row(row: &Row, boards: [Board; 2]) -> DbResult<Self> {
        let result: String = row.try_get("result")?;

        Ok(Self {
            id: row.try_get("id")?,
            player1_id: row.try_get("player1_id")?,
            player1_name: row.try_get("player1_name")?,
            player2_id: row.try_get("player2_id")?,
            player2_name: row.try_get("player2_name")?,
            result: result.parse()?,
            next_turn: row.try_get("next_turn")?,
            created_at: row.try_get("created_at")?,
            end_date: row.try_get("end_date")?,
            boards,
        })
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        if player_id == self.player1_id {
            Some(Seat::Player1)
        } else if player_id == self.player2_id {
            Some(Seat::Player2)
        } else {
            None
        }
    }

    pub fn player_id(&self, seat: Seat) -> PlayerId {
        match seat {
            Seat::Player1 => self.player1_id,
            Seat::Player2 => self.player2_id,
        }
    }

    pub fn player_name(&self, seat: Seat) -> &str {
        match seat {
            Seat::Player1 => &self.player1_name,
            Seat::Player2 => &self.player2_name,
        }
    }

    pub fn board(&self, seat: Seat) -> &Board {
        &self.boards[seat.index()]
    }

    pub fn board_mut(&mut self, seat: Seat) -> &mut Board {
        &mut self.boards[seat.index()]
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_finished()
    }

    pub fn is_turn_of(&self, name: &str) -> bool {
        self.next_turn.as_deref() == Some(name)
    }
}

/// Public view of a game, optionally with the requesting player's own board.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub sid: GameId,
    pub end_date: Option<DateTime<Utc>>,
    pub result: GameResult,
    pub player1_name: String,
    pub player2_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_lived_board: Option<Board>,
}

impl GameView {
    pub fn summary(game: &Game) -> Self {
        Self {
            sid: game.id,
            end_date: game.end_date,
            result: game.result,
            player1_name: game.player1_name.clone(),
            player2_name: game.player2_name.clone(),
            player_lived_board: None,
        }
    }

    /// Summary plus the board owned by `player_id`, if they play in this game.
    pub fn for_player(game: &Game, player_id: PlayerId) -> Self {
        let mut view = Self::summary(game);
        view.player_lived_board = game.seat_of(player_id).map(|seat| game.board(seat).clone());
        view
    }
}
