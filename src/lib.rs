mod bitboard;
mod board;
mod common;
mod config;
pub mod console;
mod events;
mod game;
mod ledger;
mod logging;
pub mod prelude;
pub mod registry;
mod ship;
mod ui;

pub use bitboard::{BitBoard, Grid};
pub use board::*;
pub use common::*;
pub use config::*;
pub use events::*;
pub use game::*;
pub use ledger::*;
pub use logging::{init_logging, level_from};
pub use registry::{lock_session, Action, ActionReport, PairKey, SessionHandle, SessionRegistry};
pub use ship::*;
pub use ui::render_board;
