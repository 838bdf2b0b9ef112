mod common;

use std::collections::BTreeMap;

use battleship_arena::{
    check_placement, random_placement, Board, Coord, EngineConfig, FleetRequirement, GameSession,
    Orientation, Phase, PlayerId, SessionRegistry, SessionSnapshot, Ship,
};
use common::*;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A session with random fleets and a random number of legal shots.
fn random_session(seed: u64) -> GameSession {
    let mut rng = SmallRng::seed_from_u64(seed);
    let config = EngineConfig::default();
    let mut session = new_session(&config);
    for who in [alice(), bob()] {
        let mut mirror = Board::new();
        for length in config.fleet.ship_lengths() {
            let (origin, orientation) = random_placement(&mut rng, &mirror, length).unwrap();
            mirror.place_ship(&check_placement(&mirror, origin, length, orientation).unwrap());
            session.place_ship(&who, length, origin, orientation).unwrap();
        }
        session.finish_placement(&who).unwrap();
    }

    let shots = rng.random_range(0..120);
    for _ in 0..shots {
        if session.phase() != Phase::Firing {
            break;
        }
        let shooter = session.turn_holder().cloned().unwrap();
        let open: Vec<Coord> = Coord::all()
            .filter(|&c| !session.participant(&shooter).unwrap().shots().cell(c).is_resolved())
            .collect();
        let target = open[rng.random_range(0..open.len())];
        session.fire(&shooter, &target.to_string()).unwrap();
    }
    session
}

fn bit(label: &str) -> u128 {
    let c = at(label);
    1u128 << (c.row() as usize * 10 + c.col() as usize)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn session_snapshot_roundtrip(seed in any::<u64>()) {
        let session = random_session(seed);
        let bytes = session.snapshot().to_bytes().unwrap();
        let decoded = SessionSnapshot::from_bytes(&bytes).unwrap();
        let restored = GameSession::restore(decoded).unwrap();
        prop_assert_eq!(restored, session);
    }
}

#[test]
fn test_restored_session_keeps_playing() {
    let mut session = firing_session(&EngineConfig::default());
    session.fire(&bob(), "A1").unwrap();
    let mut restored = GameSession::restore(session.snapshot()).unwrap();
    assert_eq!(restored.turn_holder(), Some(&alice()));
    assert!(restored.fire(&alice(), "C3").is_ok());
    assert_eq!(
        restored.fire(&alice(), "C3").unwrap_err(),
        battleship_arena::EngineError::AlreadyFired
    );
}

#[test]
fn test_adopted_session_is_routable() {
    let session = firing_session(&EngineConfig::default());
    let registry = SessionRegistry::new(EngineConfig::default());
    registry.adopt(GameSession::restore(session.snapshot()).unwrap()).unwrap();
    assert!(registry.session_for(&bob()).is_some());
    assert!(registry.adopt(session).is_err());

    // fresh ids never collide with the adopted one
    let next = registry
        .start_session(PlayerId::from("carol"), PlayerId::from("dave"))
        .unwrap();
    assert!(battleship_arena::lock_session(&next).id().0 > 1);
}

#[test]
fn test_restore_rejects_unseated_turn_holder() {
    let mut snapshot = firing_session(&EngineConfig::default()).snapshot();
    snapshot.turn = Some(PlayerId::from("carol"));
    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_duplicate_seats() {
    let mut snapshot = new_session(&EngineConfig::default()).snapshot();
    snapshot.players[1].id = alice();
    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_unmirrored_shot_log() {
    let mut snapshot = firing_session(&EngineConfig::default()).snapshot();
    snapshot.players[1].shots.misses |= bit("A1");
    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_ship_map_mismatch() {
    let mut snapshot = firing_session(&EngineConfig::default()).snapshot();
    snapshot.players[0].board.ships &= !bit("A6");
    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_hit_on_open_water() {
    let mut snapshot = firing_session(&EngineConfig::default()).snapshot();
    snapshot.players[0].board.hits |= bit("A1");
    snapshot.players[1].shots.hits |= bit("A1");
    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_phase_inconsistencies() {
    let mut placement = new_session(&EngineConfig::default()).snapshot();
    placement.turn = Some(bob());
    assert!(GameSession::restore(placement).is_err());

    let mut firing = firing_session(&EngineConfig::default()).snapshot();
    firing.players[0].ready = false;
    assert!(GameSession::restore(firing).is_err());

    let mut firing = firing_session(&EngineConfig::default()).snapshot();
    firing.winner = Some(alice());
    assert!(GameSession::restore(firing).is_err());
}

#[test]
fn test_abandoned_placement_restores() {
    let mut session = new_session(&EngineConfig::default());
    place_fleet(&mut session, &alice(), &LAYOUT_A[..2]);
    session.abandon();
    let restored = GameSession::restore(session.snapshot()).unwrap();
    assert_eq!(restored.phase(), Phase::Completed);
    assert_eq!(restored.winner(), None);
}

#[test]
fn test_restore_rejects_ready_without_fleet() {
    let mut session = new_session(&EngineConfig::default());
    place_fleet(&mut session, &bob(), &LAYOUT_B);
    let mut snapshot = session.snapshot();
    snapshot.players[0].ready = true;

    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_ready_with_partial_fleet() {
    let mut session = new_session(&EngineConfig::default());
    place_fleet(&mut session, &alice(), &LAYOUT_A[..3]);
    let mut snapshot = session.snapshot();
    snapshot.players[0].ready = true;

    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_over_placed_lengths() {
    let mut session = new_session(&EngineConfig::default());
    place_fleet(&mut session, &alice(), &LAYOUT_A);
    let mut snapshot = session.snapshot();

    // a second destroyer, smuggled in through a session with a larger fleet
    let roomy = EngineConfig {
        fleet: FleetRequirement::new([(2, 2), (3, 2), (4, 1), (5, 1)]).unwrap(),
        ..EngineConfig::default()
    };
    let mut other = new_session(&roomy);
    place_fleet(&mut other, &alice(), &LAYOUT_A);
    other
        .place_ship(&alice(), 2, at("J1"), Orientation::Right)
        .unwrap();
    snapshot.players[0] = other.snapshot().players[0].clone();

    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restore_rejects_ships_filed_under_wrong_length() {
    let mut session = new_session(&EngineConfig::default());
    session
        .place_ship(&alice(), 2, at("A1"), Orientation::Right)
        .unwrap();
    let mut snapshot = session.snapshot();

    // re-key the destroyer as a length 3 entry
    let cells: Vec<Coord> = vec![at("A1"), at("A2")];
    let ship = Ship::from_cells(cells).unwrap();
    let forged: BTreeMap<u8, Vec<Ship>> = BTreeMap::from([(3, vec![ship])]);
    snapshot.players[0].ships = bincode::deserialize(&bincode::serialize(&forged).unwrap()).unwrap();

    assert!(GameSession::restore(snapshot).is_err());
}

#[test]
fn test_restored_placement_cannot_skip_to_firing_unarmed() {
    let mut session = new_session(&EngineConfig::default());
    place_fleet(&mut session, &bob(), &LAYOUT_B);
    place_fleet(&mut session, &alice(), &LAYOUT_A);
    session.finish_placement(&alice()).unwrap();

    let mut restored = GameSession::restore(session.snapshot()).unwrap();
    assert!(restored.participant(&alice()).unwrap().is_ready());
    restored.finish_placement(&bob()).unwrap();
    assert_eq!(restored.phase(), Phase::Firing);
    for p in restored.participants() {
        assert!(p.ships().satisfies(restored.fleet()));
    }
}
