use battleship_arena::{Board, Coord, FleetRequirement, Orientation, Ship, ShipRegistry};

fn c(row: u8, col: u8) -> Coord {
    Coord::new(row, col).unwrap()
}

#[test]
fn test_from_cells_accepts_straight_runs() {
    let ship = Ship::from_cells(vec![c(2, 1), c(2, 2), c(2, 3)]).unwrap();
    assert_eq!(ship.len(), 3);
    assert!(ship.contains(c(2, 2)));
    assert!(!ship.contains(c(3, 2)));

    // descending runs are fine
    assert!(Ship::from_cells(vec![c(4, 0), c(3, 0)]).is_some());
}

#[test]
fn test_from_cells_rejects_bad_shapes() {
    assert!(Ship::from_cells(vec![c(0, 0)]).is_none());
    assert!(Ship::from_cells(vec![c(0, 0), c(0, 1), c(0, 2), c(0, 3), c(0, 4), c(0, 5)]).is_none());
    assert!(Ship::from_cells(vec![c(0, 0), c(0, 2)]).is_none());
    assert!(Ship::from_cells(vec![c(0, 0), c(1, 1)]).is_none());
    assert!(Ship::from_cells(vec![c(0, 0), c(0, 1), c(1, 1)]).is_none());
}

#[test]
fn test_registry_groups_by_length() {
    let mut ships = ShipRegistry::new();
    ships.add(Ship::from_cells(vec![c(0, 0), c(0, 1), c(0, 2)]).unwrap());
    ships.add(Ship::from_cells(vec![c(2, 0), c(2, 1), c(2, 2)]).unwrap());
    ships.add(Ship::from_cells(vec![c(4, 0), c(4, 1)]).unwrap());
    assert_eq!(ships.count(3), 2);
    assert_eq!(ships.count(2), 1);
    assert_eq!(ships.ship_at(c(2, 1)).map(Ship::len), Some(3));
    assert!(ships.ship_at(c(9, 9)).is_none());

    // most recent of a length goes first
    let popped = ships.pop(3).unwrap();
    assert!(popped.contains(c(2, 0)));
    assert_eq!(ships.count(3), 1);
    assert!(ships.pop(5).is_none());

    assert_eq!(ships.drain().len(), 2);
    assert!(ships.is_empty());
}

#[test]
fn test_registry_satisfies_exact_counts() {
    let fleet = FleetRequirement::new([(2, 1), (3, 1)]).unwrap();
    let mut ships = ShipRegistry::new();
    ships.add(Ship::from_cells(vec![c(0, 0), c(0, 1)]).unwrap());
    assert!(!ships.satisfies(&fleet));
    ships.add(Ship::from_cells(vec![c(2, 0), c(2, 1), c(2, 2)]).unwrap());
    assert!(ships.satisfies(&fleet));
    ships.add(Ship::from_cells(vec![c(4, 0), c(4, 1)]).unwrap());
    assert!(!ships.satisfies(&fleet));
}

#[test]
fn test_fleet_requirement() {
    let fleet = FleetRequirement::default();
    assert_eq!(fleet.ship_lengths(), vec![5, 4, 3, 3, 2]);
    assert_eq!(fleet.required(3), 2);
    assert!(!fleet.is_recognized(6));
    assert!(FleetRequirement::new([(6, 1)]).is_err());
    assert!(!FleetRequirement::new([(2, 0)]).unwrap().is_recognized(2));
}

#[test]
fn test_ship_not_sunk_on_fresh_board() {
    let ship = Ship::from_cells(vec![c(0, 0), c(0, 1)]).unwrap();
    let mut board = Board::new();
    board.place_ship(ship.cells());
    assert!(!ship.is_sunk_on(&board));
}

#[test]
fn test_orientation_parse() {
    assert_eq!("Right".parse::<Orientation>().unwrap(), Orientation::Right);
    assert_eq!("u".parse::<Orientation>().unwrap(), Orientation::Up);
    assert!("diagonal".parse::<Orientation>().is_err());
}

#[test]
fn test_origin_and_orientation() {
    let down = Ship::from_cells(vec![c(1, 4), c(2, 4), c(3, 4)]).unwrap();
    assert_eq!(down.origin(), c(1, 4));
    assert_eq!(down.orientation(), Orientation::Down);

    let left = Ship::from_cells(vec![c(6, 6), c(6, 5)]).unwrap();
    assert_eq!(left.orientation(), Orientation::Left);
    let up = Ship::from_cells(vec![c(6, 6), c(5, 6)]).unwrap();
    assert_eq!(up.orientation(), Orientation::Up);
    let right = Ship::from_cells(vec![c(0, 0), c(0, 1)]).unwrap();
    assert_eq!(right.orientation(), Orientation::Right);
}

#[test]
fn test_registry_within_requirement() {
    let fleet = FleetRequirement::new([(2, 1), (3, 1)]).unwrap();
    let mut ships = ShipRegistry::new();
    assert!(ships.within(&fleet));
    assert!(ships.is_consistent());
    ships.add(Ship::from_cells(vec![c(0, 0), c(0, 1)]).unwrap());
    assert!(ships.within(&fleet));
    ships.add(Ship::from_cells(vec![c(2, 0), c(2, 1)]).unwrap());
    assert!(!ships.within(&fleet));
    ships.pop(2);
    ships.add(Ship::from_cells(vec![c(4, 0), c(4, 1), c(4, 2), c(4, 3)]).unwrap());
    assert!(!ships.within(&fleet));
}

#[test]
fn test_ship_decoding_rejects_bad_shapes() {
    let ship = Ship::from_cells(vec![c(0, 0), c(1, 0)]).unwrap();
    let bytes = bincode::serialize(&ship).unwrap();
    assert_eq!(bincode::deserialize::<Ship>(&bytes).unwrap(), ship);

    let gap = bincode::serialize(&vec![c(0, 0), c(0, 2)]).unwrap();
    assert!(bincode::deserialize::<Ship>(&gap).is_err());
    let empty = bincode::serialize(&Vec::<Coord>::new()).unwrap();
    assert!(bincode::deserialize::<Ship>(&empty).is_err());
}
