//! Ships, the per-participant ship registry and placement validation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::common::{Coord, EngineError};
use crate::config::{FleetRequirement, BOARD_SIZE, MAX_SHIP_LEN, MIN_SHIP_LEN};

/// Direction a ship extends from its origin cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
        Orientation::Up,
    ];

    fn step(self) -> (i16, i16) {
        match self {
            Orientation::Up => (-1, 0),
            Orientation::Down => (1, 0),
            Orientation::Left => (0, -1),
            Orientation::Right => (0, 1),
        }
    }
}

impl core::str::FromStr for Orientation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Orientation::Up),
            "down" | "d" => Ok(Orientation::Down),
            "left" | "l" => Ok(Orientation::Left),
            "right" | "r" => Ok(Orientation::Right),
            other => Err(anyhow::anyhow!("unknown orientation '{}'", other)),
        }
    }
}

/// A placed ship: its cells in order from the origin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coord>", into = "Vec<Coord>")]
pub struct Ship {
    cells: Vec<Coord>,
}

impl Ship {
    /// Accepts a straight, gap-free run of `MIN_SHIP_LEN..=MAX_SHIP_LEN` cells.
    pub fn from_cells(cells: Vec<Coord>) -> Option<Self> {
        let len = cells.len();
        if len < MIN_SHIP_LEN as usize || len > MAX_SHIP_LEN as usize {
            return None;
        }
        let d_row = i16::from(cells[1].row()) - i16::from(cells[0].row());
        let d_col = i16::from(cells[1].col()) - i16::from(cells[0].col());
        if d_row.abs() + d_col.abs() != 1 {
            return None;
        }
        let contiguous = cells
            .windows(2)
            .all(|w| w[0].offset(d_row, d_col) == Some(w[1]));
        contiguous.then_some(Ship { cells })
    }

    pub fn len(&self) -> u8 {
        self.cells.len() as u8
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.cells.contains(&at)
    }

    pub fn origin(&self) -> Coord {
        self.cells[0]
    }

    /// Direction from the origin toward the remaining cells.
    pub fn orientation(&self) -> Orientation {
        let (a, b) = (self.cells[0], self.cells[1]);
        match (b.row().cmp(&a.row()), b.col().cmp(&a.col())) {
            (Ordering::Less, _) => Orientation::Up,
            (Ordering::Greater, _) => Orientation::Down,
            (_, Ordering::Less) => Orientation::Left,
            _ => Orientation::Right,
        }
    }

    /// Every cell is HIT on `board`.
    pub fn is_sunk_on(&self, board: &Board) -> bool {
        board.hits().contains_all(&self.cells)
    }
}

impl TryFrom<Vec<Coord>> for Ship {
    type Error = &'static str;

    fn try_from(cells: Vec<Coord>) -> Result<Self, Self::Error> {
        Ship::from_cells(cells).ok_or("ship cells are not a straight run of 2 to 5")
    }
}

impl From<Ship> for Vec<Coord> {
    fn from(ship: Ship) -> Self {
        ship.cells
    }
}

/// Placed ships grouped by length. Several ships may share a length, so each
/// length maps to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipRegistry {
    by_length: BTreeMap<u8, Vec<Ship>>,
}

impl ShipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ship: Ship) {
        self.by_length.entry(ship.len()).or_default().push(ship);
    }

    /// Remove the most recently placed ship of `len`.
    pub fn pop(&mut self, len: u8) -> Option<Ship> {
        let ships = self.by_length.get_mut(&len)?;
        let ship = ships.pop();
        if ships.is_empty() {
            self.by_length.remove(&len);
        }
        ship
    }

    /// Remove and return every ship.
    pub fn drain(&mut self) -> Vec<Ship> {
        core::mem::take(&mut self.by_length)
            .into_values()
            .flatten()
            .collect()
    }

    pub fn count(&self, len: u8) -> usize {
        self.by_length.get(&len).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.by_length.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ship> {
        self.by_length.values().flatten()
    }

    pub fn ship_at(&self, at: Coord) -> Option<&Ship> {
        self.iter().find(|s| s.contains(at))
    }

    /// Every list is non-empty and holds only ships of its key's length.
    pub fn is_consistent(&self) -> bool {
        self.by_length
            .iter()
            .all(|(&len, ships)| !ships.is_empty() && ships.iter().all(|s| s.len() == len))
    }

    /// No length is over-placed or outside `requirement`.
    pub fn within(&self, requirement: &FleetRequirement) -> bool {
        self.by_length
            .iter()
            .all(|(&len, ships)| ships.len() <= requirement.required(len) as usize)
    }

    /// Counts match `requirement` exactly, length for length.
    pub fn satisfies(&self, requirement: &FleetRequirement) -> bool {
        let lengths_match = self
            .by_length
            .keys()
            .all(|&len| requirement.is_recognized(len));
        lengths_match
            && requirement
                .iter()
                .all(|(len, count)| self.count(len) == count as usize)
    }
}

/// The `length` cells from `origin` in `orientation`, or the reason they
/// cannot hold a ship: `OutOfBounds` if any cell leaves the grid, `Overlap`
/// if any cell is not EMPTY. Does not touch the board.
pub fn check_placement(
    board: &Board,
    origin: Coord,
    length: u8,
    orientation: Orientation,
) -> Result<Vec<Coord>, EngineError> {
    let (d_row, d_col) = orientation.step();
    let mut coords = Vec::with_capacity(length as usize);
    for i in 0..i16::from(length) {
        let at = origin
            .offset(d_row * i, d_col * i)
            .ok_or(EngineError::OutOfBounds)?;
        coords.push(at);
    }
    if coords.iter().any(|&c| !board.is_empty_at(c)) {
        return Err(EngineError::Overlap);
    }
    Ok(coords)
}

/// `Some(coords)` when the placement is legal, `None` otherwise.
pub fn can_place(
    board: &Board,
    origin: Coord,
    length: u8,
    orientation: Orientation,
) -> Option<Vec<Coord>> {
    check_placement(board, origin, length, orientation).ok()
}

/// Pick a random legal placement for a ship of `length`.
pub fn random_placement<R: Rng>(
    rng: &mut R,
    board: &Board,
    length: u8,
) -> Result<(Coord, Orientation), EngineError> {
    for _ in 0..200 {
        let orientation = Orientation::ALL[rng.random_range(0..Orientation::ALL.len())];
        let origin = Coord::new(rng.random_range(0..BOARD_SIZE), rng.random_range(0..BOARD_SIZE))
            .ok_or(EngineError::OutOfBounds)?;
        if can_place(board, origin, length, orientation).is_some() {
            return Ok((origin, orientation));
        }
    }
    // random probing gave up; scan deterministically
    Coord::all()
        .flat_map(|c| Orientation::ALL.into_iter().map(move |o| (c, o)))
        .find(|&(c, o)| can_place(board, c, length, o).is_some())
        .ok_or(EngineError::Overlap)
}

/// Fill `board` and `ships` with a random fleet meeting `requirement`.
/// Longest ships go first.
pub fn random_fleet<R: Rng>(
    rng: &mut R,
    requirement: &FleetRequirement,
    board: &mut Board,
    ships: &mut ShipRegistry,
) -> Result<(), EngineError> {
    for len in requirement.ship_lengths() {
        let (origin, orientation) = random_placement(rng, board, len)?;
        let coords = check_placement(board, origin, len, orientation)?;
        board.place_ship(&coords);
        if let Some(ship) = Ship::from_cells(coords) {
            ships.add(ship);
        }
    }
    Ok(())
}
