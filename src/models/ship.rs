use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipClass {
    Speedboat,
    Destroyer,
    Battleship,
    Cruiser,
}

impl ShipClass {
    /// Number of cells a ship of this class occupies.
    pub fn length(&self) -> usize {
        match self {
            ShipClass::Speedboat => 1,
            ShipClass::Destroyer => 2,
            ShipClass::Battleship => 3,
            ShipClass::Cruiser => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipClass::Speedboat => "speedboat",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Battleship => "battleship",
            ShipClass::Cruiser => "cruiser",
        }
    }
}

impl core::fmt::Display for ShipClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every board carries exactly this fleet, placed in this order.
pub const FLEET: [ShipClass; 10] = [
    ShipClass::Cruiser,
    ShipClass::Battleship,
    ShipClass::Battleship,
    ShipClass::Destroyer,
    ShipClass::Destroyer,
    ShipClass::Destroyer,
    ShipClass::Speedboat,
    ShipClass::Speedboat,
    ShipClass::Speedboat,
    ShipClass::Speedboat,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    #[serde(rename = "name")]
    pub class: ShipClass,
    /// Cell ids not hit yet, in placement order
    pub location: Vec<String>,
}

impl Ship {
    pub fn new(class: ShipClass, location: Vec<String>) -> Self {
        Self { class, location }
    }

    pub fn occupies(&self, cell: &str) -> bool {
        self.location.iter().any(|c| c == cell)
    }

    /// Removes a struck cell. Returns false if the ship never covered it.
    pub fn remove_location(&mut self, cell: &str) -> bool {
        match self.location.iter().position(|c| c == cell) {
            Some(idx) => {
                self.location.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.location.len()
    }
}
