use crate::models::ship::{Ship, ShipClass};
use serde::{Deserialize, Serialize};

/// Outcome of a single attack on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// Cell was attacked before; nothing changed
    Repeat,
    Miss,
    Hit(ShipClass),
    /// Last remaining cell of a ship was struck and the ship was removed
    Sunk(ShipClass),
}

/// One player's remaining fleet, as attacked by the opponent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub ships: Vec<Ship>,
    /// Cells already attacked on this board
    #[serde(default)]
    pub attacked: Vec<String>,
}

impl Board {
    pub fn new(ships: Vec<Ship>) -> Self {
        Self {
            ships,
            attacked: Vec::new(),
        }
    }

    pub fn was_attacked(&self, cell: &str) -> bool {
        self.attacked.iter().any(|c| c == cell)
    }

    pub fn ship_at(&self, cell: &str) -> Option<usize> {
        self.ships.iter().position(|s| s.occupies(cell))
    }

    /// Resolves an attack on `cell`, shrinking the struck ship or removing it when sunk.
    pub fn strike(&mut self, cell: &str) -> Strike {
        if self.was_attacked(cell) {
            return Strike::Repeat;
        }
        self.attacked.push(cell.to_string());

        let Some(idx) = self.ship_at(cell) else {
            return Strike::Miss;
        };

        let class = self.ships[idx].class;
        if self.ships[idx].remaining() == 1 {
            self.ships.remove(idx);
            Strike::Sunk(class)
        } else {
            self.ships[idx].remove_location(cell);
            Strike::Hit(class)
        }
    }

    /// True once every ship on the board has been sunk.
    pub fn is_defeated(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn clear(&mut self) {
        self.ships.clear();
    }
}
