//! Per-participant board: ship occupancy plus hits and misses, stored as
//! three bitboards. The same type doubles as a shot log (no ships, only
//! resolved cells).

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bitboard::Grid;
use crate::common::{Cell, Coord, FireOutcome};
use crate::config::BOARD_SIZE;

/// Serializable board state for saving sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub ships: u128,
    pub hits: u128,
    pub misses: u128,
}

/// Plain 10×10 cell matrix handed to the host for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub cells: [[Cell; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl BoardSnapshot {
    pub fn cell(&self, at: Coord) -> Cell {
        self.cells[at.row() as usize][at.col() as usize]
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Board {
    ships: Grid,
    hits: Grid,
    misses: Grid,
}

impl Board {
    /// A 10×10 board with every cell empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, at: Coord) -> Cell {
        if self.hits.get(at) {
            Cell::Hit
        } else if self.misses.get(at) {
            Cell::Miss
        } else if self.ships.get(at) {
            Cell::Ship
        } else {
            Cell::Empty
        }
    }

    pub fn is_empty_at(&self, at: Coord) -> bool {
        self.cell(at) == Cell::Empty
    }

    /// Mark every coordinate as SHIP. Legality must be checked beforehand
    /// (see [`crate::check_placement`]).
    pub fn place_ship(&mut self, coords: &[Coord]) {
        for &c in coords {
            debug_assert!(self.is_empty_at(c), "placing over occupied cell {}", c);
            self.ships.set(c);
        }
    }

    /// Reset every coordinate to EMPTY.
    pub fn remove_ship(&mut self, coords: &[Coord]) {
        for &c in coords {
            self.ships.clear(c);
            self.hits.clear(c);
            self.misses.clear(c);
        }
    }

    /// Record a resolved shot at `at`.
    pub(crate) fn mark(&mut self, at: Coord, outcome: FireOutcome) {
        debug_assert!(!self.cell(at).is_resolved(), "cell {} resolved twice", at);
        match outcome {
            FireOutcome::Hit => self.hits.set(at),
            FireOutcome::Miss => self.misses.set(at),
        }
    }

    pub fn ship_map(&self) -> Grid {
        self.ships
    }

    pub fn hits(&self) -> Grid {
        self.hits
    }

    pub fn misses(&self) -> Grid {
        self.misses
    }

    /// Number of cells already fired upon.
    pub fn shots_resolved(&self) -> usize {
        (self.hits | self.misses).count_ones()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut cells = [[Cell::Empty; BOARD_SIZE as usize]; BOARD_SIZE as usize];
        for at in Coord::all() {
            cells[at.row() as usize][at.col() as usize] = self.cell(at);
        }
        BoardSnapshot { cells }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Board {{\n  ships: {:?},\n  hits: {:?},\n  misses: {:?}\n}}",
            self.ships, self.hits, self.misses
        )
    }
}

impl From<&Board> for BoardState {
    fn from(b: &Board) -> Self {
        BoardState {
            ships: b.ships.into_raw(),
            hits: b.hits.into_raw(),
            misses: b.misses.into_raw(),
        }
    }
}

impl From<BoardState> for Board {
    fn from(state: BoardState) -> Self {
        Board {
            ships: Grid::from_raw(state.ships),
            hits: Grid::from_raw(state.hits),
            misses: Grid::from_raw(state.misses),
        }
    }
}
