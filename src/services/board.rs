use crate::models::board::Board;
use crate::models::cell::{BOARD_SIZE, cell_id};
use crate::models::ship::{FLEET, Ship, ShipClass};
use rand::Rng;

const N: usize = BOARD_SIZE as usize;

/// Attempts for a single ship before the whole layout is thrown away and restarted.
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

/// Occupancy grid used while placing a fleet.
struct Grid {
    cells: [[bool; N]; N],
}

impl Grid {
    fn new() -> Self {
        Self { cells: [[false; N]; N] }
    }

    fn occupied(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 || row >= N as isize || col >= N as isize {
            return false;
        }
        self.cells[row as usize][col as usize]
    }

    /// Cells covered by a run, or `None` when it would leave the grid.
    fn run(row: usize, col: usize, len: usize, orientation: Orientation) -> Option<Vec<(usize, usize)>> {
        match orientation {
            Orientation::Horizontal if col + len <= N => Some((0..len).map(|i| (row, col + i)).collect()),
            Orientation::Vertical if row + len <= N => Some((0..len).map(|i| (row + i, col)).collect()),
            _ => None,
        }
    }

    /// A run fits when neither its cells nor any of their eight neighbours are occupied.
    /// That covers the cells before and after the run, both flanks, and the four corners.
    fn can_place(&self, run: &[(usize, usize)]) -> bool {
        run.iter().all(|&(r, c)| {
            (-1..=1).all(|dr| (-1..=1).all(|dc| !self.occupied(r as isize + dr, c as isize + dc)))
        })
    }

    fn mark(&mut self, run: &[(usize, usize)]) {
        for &(r, c) in run {
            self.cells[r][c] = true;
        }
    }
}

fn try_place<R: Rng>(grid: &mut Grid, class: ShipClass, rng: &mut R) -> Option<Ship> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let orientation = if rng.random_bool(0.5) {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let row = rng.random_range(0..N);
        let col = rng.random_range(0..N);

        let Some(run) = Grid::run(row, col, class.length(), orientation) else {
            continue;
        };
        if !grid.can_place(&run) {
            continue;
        }

        grid.mark(&run);
        let location = run.iter().map(|&(r, c)| cell_id(r as u8, c as u8)).collect();
        return Some(Ship::new(class, location));
    }

    None
}

/// Generates a random, valid layout for the full fleet.
pub fn generate_board() -> Board {
    generate_board_with(&mut rand::rng())
}

/// Same as [`generate_board`] but drawing from the given source of randomness.
pub fn generate_board_with<R: Rng>(rng: &mut R) -> Board {
    'layout: loop {
        let mut grid = Grid::new();
        let mut ships = Vec::with_capacity(FLEET.len());

        for class in FLEET {
            match try_place(&mut grid, class, rng) {
                Some(ship) => ships.push(ship),
                None => {
                    tracing::debug!(%class, "fleet placement stuck, restarting layout");
                    continue 'layout;
                }
            }
        }

        return Board::new(ships);
    }
}
