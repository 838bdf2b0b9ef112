//! Outbound notifications for the host to render or relay.

use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::game::{PlayerId, SessionId};

/// Which of a participant's two grids a [`Event::BoardChanged`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardView {
    /// Own ships and the damage taken.
    Fleet,
    /// Own shots against the opponent.
    Shots,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BoardChanged {
        session: SessionId,
        participant: PlayerId,
        view: BoardView,
        board: BoardSnapshot,
    },
    /// A participant locked in a complete fleet.
    PlacementReady {
        session: SessionId,
        participant: PlayerId,
    },
    ShipSunk {
        session: SessionId,
        owner: PlayerId,
        length: u8,
    },
    TurnChanged {
        session: SessionId,
        holder: PlayerId,
    },
    GameOver {
        session: SessionId,
        winner: PlayerId,
        loser: PlayerId,
    },
}
