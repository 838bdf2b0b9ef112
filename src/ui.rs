//! Text rendering of boards for console hosts.

use std::fmt::Write;

use crate::board::BoardSnapshot;
use crate::common::{Cell, Coord, ROW_LABELS};
use crate::config::BOARD_SIZE;

fn glyph(cell: Cell) -> char {
    match cell {
        Cell::Empty => '.',
        Cell::Ship => 'S',
        Cell::Hit => 'X',
        Cell::Miss => 'o',
    }
}

/// Render a board with row letters A–J down the side and columns 1–10 across.
pub fn render_board(board: &BoardSnapshot) -> String {
    let mut out = String::from("  ");
    for col in 1..=BOARD_SIZE {
        let _ = write!(out, " {:>2}", col);
    }
    out.push('\n');
    for (row, label) in ROW_LABELS.iter().enumerate() {
        let _ = write!(out, "{} ", label);
        for col in 0..BOARD_SIZE {
            let cell = Coord::new(row as u8, col).map_or(Cell::Empty, |c| board.cell(c));
            let _ = write!(out, "  {}", glyph(cell));
        }
        out.push('\n');
    }
    out
}
