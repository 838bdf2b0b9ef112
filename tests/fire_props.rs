mod common;

use battleship_arena::{
    all_ships_sunk, Board, BoardState, Cell, Coord, EngineConfig, EngineError, FireOutcome,
    Phase, Ship, ShipRegistry, TurnPolicy,
};
use common::*;
use proptest::prelude::*;

fn policy() -> impl Strategy<Value = TurnPolicy> {
    prop_oneof![Just(TurnPolicy::HitKeepsTurn), Just(TurnPolicy::Alternate)]
}

fn label() -> impl Strategy<Value = String> {
    (0u8..10, 0u8..10).prop_map(|(r, c)| Coord::new(r, c).unwrap().to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every accepted shot changes exactly one cell on each side and moves
    /// the turn per policy; a repeated shot is rejected without mutation.
    #[test]
    fn fire_sequence_keeps_invariants(
        turn_policy in policy(),
        targets in prop::collection::vec(label(), 1..150),
    ) {
        let config = EngineConfig { turn_policy, ..EngineConfig::default() };
        let mut session = firing_session(&config);

        for target in targets {
            if session.phase() != Phase::Firing {
                break;
            }
            let shooter = session.turn_holder().cloned().unwrap();
            let defender = session.opponent_of(&shooter).cloned().unwrap();
            let at: Coord = target.parse().unwrap();
            let before = session.clone();
            let shots_before = before.participant(&shooter).unwrap().shots().shots_resolved();

            match session.fire(&shooter, &target) {
                Ok(report) => {
                    let own = session.participant(&shooter).unwrap();
                    let foe = session.participant(&defender).unwrap();
                    let expected = match report.outcome {
                        FireOutcome::Hit => Cell::Hit,
                        FireOutcome::Miss => Cell::Miss,
                    };
                    prop_assert_eq!(own.shots().cell(at), expected);
                    prop_assert_eq!(foe.board().cell(at), expected);
                    prop_assert_eq!(own.shots().shots_resolved(), shots_before + 1);

                    if session.phase() == Phase::Firing {
                        let keeps = turn_policy == TurnPolicy::HitKeepsTurn
                            && report.outcome == FireOutcome::Hit;
                        let holder = if keeps { &shooter } else { &defender };
                        prop_assert_eq!(session.turn_holder(), Some(holder));
                    } else {
                        prop_assert_eq!(session.winner(), Some(&shooter));
                    }
                }
                Err(e) => {
                    prop_assert_eq!(e, EngineError::AlreadyFired);
                    prop_assert!(before.participant(&shooter).unwrap().shots().cell(at).is_resolved());
                    prop_assert_eq!(&session, &before);
                }
            }
        }
    }
}

fn c(label: &str) -> Coord {
    label.parse().unwrap()
}

#[test]
fn test_all_ships_sunk_needs_every_hit() {
    let mut ships = ShipRegistry::new();
    let destroyer = Ship::from_cells(vec![c("A1"), c("A2")]).unwrap();
    let cruiser = Ship::from_cells(vec![c("C5"), c("D5"), c("E5")]).unwrap();
    ships.add(destroyer.clone());
    ships.add(cruiser.clone());

    let mut occupied = Board::new();
    occupied.place_ship(destroyer.cells());
    occupied.place_ship(cruiser.cells());
    let ship_bits = BoardState::from(&occupied).ships;

    let all_hit = Board::from(BoardState {
        ships: ship_bits,
        hits: ship_bits,
        misses: 0,
    });
    assert!(all_ships_sunk(&ships, &all_hit));

    let one_short = Board::from(BoardState {
        ships: ship_bits,
        hits: ship_bits & !(1u128 << 44),
        misses: 0,
    });
    assert_eq!(one_short.cell(c("E5")), Cell::Ship);
    assert!(!all_ships_sunk(&ships, &one_short));
    assert!(destroyer.is_sunk_on(&one_short));
}
