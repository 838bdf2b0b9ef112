#![allow(dead_code)]

use battleship_arena::{Coord, EngineConfig, GameSession, Orientation, PlayerId, SessionId};

/// Initiator's fleet: right half of the board, so A1 stays open water.
pub const LAYOUT_A: [(u8, &str, Orientation); 5] = [
    (5, "A6", Orientation::Right),
    (4, "C6", Orientation::Right),
    (3, "E6", Orientation::Right),
    (3, "G6", Orientation::Right),
    (2, "I6", Orientation::Right),
];

/// Challenged fleet: left half of the board, C3 is part of the battleship.
pub const LAYOUT_B: [(u8, &str, Orientation); 5] = [
    (5, "A1", Orientation::Right),
    (4, "C1", Orientation::Right),
    (3, "E1", Orientation::Right),
    (3, "G1", Orientation::Right),
    (2, "I1", Orientation::Right),
];

pub fn alice() -> PlayerId {
    PlayerId::from("alice")
}

pub fn bob() -> PlayerId {
    PlayerId::from("bob")
}

pub fn at(label: &str) -> Coord {
    label.parse().unwrap()
}

/// Labels of every cell covered by `layout`, ship by ship.
pub fn layout_cells(layout: &[(u8, &str, Orientation)]) -> Vec<Vec<String>> {
    layout
        .iter()
        .map(|&(len, origin, _)| {
            let start = at(origin);
            (0..len)
                .map(|i| Coord::new(start.row(), start.col() + i).unwrap().to_string())
                .collect()
        })
        .collect()
}

pub fn place_fleet(session: &mut GameSession, who: &PlayerId, layout: &[(u8, &str, Orientation)]) {
    for &(len, origin, orientation) in layout {
        session.place_ship(who, len, at(origin), orientation).unwrap();
    }
}

pub fn new_session(config: &EngineConfig) -> GameSession {
    GameSession::new(SessionId(1), alice(), bob(), config).unwrap()
}

/// Session already in the firing phase with alice on LAYOUT_A and bob on LAYOUT_B.
pub fn firing_session(config: &EngineConfig) -> GameSession {
    let mut session = new_session(config);
    place_fleet(&mut session, &alice(), &LAYOUT_A);
    place_fleet(&mut session, &bob(), &LAYOUT_B);
    session.finish_placement(&alice()).unwrap();
    session.finish_placement(&bob()).unwrap();
    session
}
