use crate::models::cell::Cell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw inbound frame: `{"x": "a", "y": 1}`.
#[derive(Debug, Deserialize)]
struct MoveFrame {
    x: String,
    y: i64,
}

/// A validated move: a column letter `a`..`j` and a row `1`..`10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell: Cell,
}

impl Move {
    /// Parses a client frame. Returns `None` for anything that is not a well-formed move.
    pub fn parse(text: &str) -> Option<Self> {
        let frame: MoveFrame = serde_json::from_str(text).ok()?;

        let mut chars = frame.x.chars();
        let letter = chars.next()?;
        if chars.next().is_some() || !letter.is_ascii_alphabetic() {
            return None;
        }
        let number = u8::try_from(frame.y).ok()?;

        Cell::from_move(letter, number).map(|cell| Move { cell })
    }
}

/// Outbound frame. The protocol is a single free-text channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub message: String,
}

impl ServerMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "message": self.message }).to_string()
    }
}

/// Everything the engine tells players during a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connected { player: String },
    Disconnected { player: String },
    Started { next: String },
    Continued { next: String },
    Moved { player: String, cell: String },
    Miss { player: String, next: String },
    Hit { player: String },
    Sunk { player: String },
    Win { player: String },
    NotYourTurn { next: String },
    AlreadyAttacked { cell: String },
    Paused,
    Invalid,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Connected { player } => write!(f, "Player \"{player}\" is connected"),
            Notice::Disconnected { player } => write!(f, "Player \"{player}\" is disconnected"),
            Notice::Started { next } => write!(f, "Start Game. Next step is \"{next}\""),
            Notice::Continued { next } => write!(f, "Game Continued. Next step is \"{next}\""),
            Notice::Moved { player, cell } => write!(f, "{player} has made a move on \"{cell}\""),
            Notice::Miss { player, next } => write!(f, "{player} miss. Next step is {next}."),
            Notice::Hit { player } => write!(f, "{player} hit ship. Next step is {player}."),
            Notice::Sunk { player } => write!(f, "{player} kill ship. Next step is {player}."),
            Notice::Win { player } => write!(f, "{player} win."),
            Notice::NotYourTurn { next } => write!(f, "It's \"{next}\" turn to walk now"),
            Notice::AlreadyAttacked { cell } => write!(f, "Cell \"{cell}\" has already been attacked"),
            Notice::Paused => f.write_str("Game Paused. Second player is disconnected"),
            Notice::Invalid => f.write_str("ERROR: The data is not JSON or cannot be validated"),
        }
    }
}

impl From<Notice> for ServerMessage {
    fn from(n: Notice) -> Self {
        ServerMessage::new(n.to_string())
    }
}
