//! Common types shared across the engine: coordinates, cell states, shot
//! outcomes and the engine error taxonomy.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::BOARD_SIZE;

/// Row labels, top to bottom.
pub const ROW_LABELS: [char; BOARD_SIZE as usize] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J'];

/// A cell on the 10×10 grid. Always in bounds once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Returns `None` when either index falls outside `0..BOARD_SIZE`.
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Coord { row, col })
        } else {
            None
        }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Step by `(d_row, d_col)`, or `None` if that leaves the grid.
    pub fn offset(&self, d_row: i16, d_col: i16) -> Option<Self> {
        let row = i16::from(self.row) + d_row;
        let col = i16::from(self.col) + d_col;
        if row < 0 || col < 0 {
            return None;
        }
        Coord::new(u8::try_from(row).ok()?, u8::try_from(col).ok()?)
    }

    /// Bit index in row-major order.
    pub(crate) fn index(&self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }

    /// Iterate every cell of the grid in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }
}

impl TryFrom<(u8, u8)> for Coord {
    type Error = EngineError;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        Coord::new(row, col).ok_or(EngineError::OutOfBounds)
    }
}

impl From<Coord> for (u8, u8) {
    fn from(c: Coord) -> Self {
        (c.row, c.col)
    }
}

/// Human label such as `A1` (row letter, 1-based column).
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ROW_LABELS[self.row as usize], self.col + 1)
    }
}

/// Parses `A1`..`J10`, case-insensitive on the row letter.
impl FromStr for Coord {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or(EngineError::InvalidTarget)?
            .to_ascii_uppercase();
        let row = ROW_LABELS
            .iter()
            .position(|&l| l == letter)
            .ok_or(EngineError::InvalidTarget)?;
        let digits = chars.as_str();
        // reject signs, whitespace and leading zeros ("A01")
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::InvalidTarget);
        }
        let col: u8 = digits.parse().map_err(|_| EngineError::InvalidTarget)?;
        if col == 0 || col > BOARD_SIZE {
            return Err(EngineError::InvalidTarget);
        }
        Coord::new(row as u8, col - 1).ok_or(EngineError::InvalidTarget)
    }
}

/// State of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// Already targeted; can never be fired upon again.
    pub fn is_resolved(self) -> bool {
        matches!(self, Cell::Hit | Cell::Miss)
    }
}

/// Result of a resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireOutcome {
    Hit,
    Miss,
}

/// Recoverable rejections returned to the host. A rejected action never
/// mutates any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Target label is not `A1`..`J10`.
    InvalidTarget,
    /// Placement would leave the grid.
    OutOfBounds,
    /// Placement would cover an occupied cell.
    Overlap,
    /// Fleet does not match the requirement.
    IncompleteFleet,
    /// Action is not valid in the session's current phase.
    WrongPhase,
    /// Shooter is not the current turn holder.
    NotYourTurn,
    /// Identity is not seated in this session.
    NotAParticipant,
    /// Cell was already hit or missed.
    AlreadyFired,
    /// Both identities are the same.
    SelfPlay,
    /// Pair or identity already has an active session.
    AlreadyActive,
    /// Identity has no active session.
    NoActiveSession,
    /// Ship length is not part of the fleet requirement.
    InvalidShipLength(u8),
    /// Every ship of this length is already placed.
    FleetFull(u8),
    /// No placed ship of this length to remove.
    NoShipToRemove(u8),
    /// Fleet requirement is empty or cannot fit on the grid.
    InvalidFleet,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidTarget => write!(f, "Invalid target, use a cell like A1"),
            EngineError::OutOfBounds => write!(f, "Ship placement is out of bounds"),
            EngineError::Overlap => write!(f, "Ship placement overlaps another ship"),
            EngineError::IncompleteFleet => write!(f, "Fleet does not match the requirement"),
            EngineError::WrongPhase => write!(f, "Action is not allowed in the current phase"),
            EngineError::NotYourTurn => write!(f, "It is not your turn"),
            EngineError::NotAParticipant => write!(f, "Not a participant in this game"),
            EngineError::AlreadyFired => write!(f, "You already fired at that cell"),
            EngineError::SelfPlay => write!(f, "You cannot play against yourself"),
            EngineError::AlreadyActive => write!(f, "A game is already active for this player"),
            EngineError::NoActiveSession => write!(f, "No active game found"),
            EngineError::InvalidShipLength(len) => write!(f, "No ship of length {} in this fleet", len),
            EngineError::FleetFull(len) => write!(f, "All ships of length {} are already placed", len),
            EngineError::NoShipToRemove(len) => write!(f, "No ship of length {} is placed", len),
            EngineError::InvalidFleet => write!(f, "Fleet must have at least one ship and fit on the board"),
        }
    }
}

impl std::error::Error for EngineError {}
