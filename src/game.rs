//! One game between two participants: shot resolution, sunk/win detection
//! and the PLACEMENT → FIRING → COMPLETED state machine.
//!
//! Every mutating method validates seat, phase and turn before touching any
//! state, so a rejected call leaves the session exactly as it was. Callers
//! that share a session across threads hold it behind a lock and call these
//! methods with the lock held; the checks then run against current state.
//!
//! Turn rules:
//! - The challenged (non-initiating) participant fires first.
//! - After a shot that does not end the game the holder moves per
//!   [`TurnPolicy`]: `HitKeepsTurn` (default) passes only on a miss,
//!   `Alternate` passes every time.

use core::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardState};
use crate::common::{Cell, Coord, EngineError, FireOutcome};
use crate::config::{EngineConfig, FleetRequirement, TurnPolicy};
use crate::events::{BoardView, Event};
use crate::ship::{check_placement, Orientation, Ship, ShipRegistry};

/// Opaque participant identity supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Placement,
    Firing,
    Completed,
}

/// One side of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    id: PlayerId,
    board: Board,
    shots: Board,
    ships: ShipRegistry,
    ready: bool,
    sunk: Vec<Ship>,
}

impl Participant {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            board: Board::new(),
            shots: Board::new(),
            ships: ShipRegistry::new(),
            ready: false,
            sunk: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Own ships and damage taken.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Own shots fired at the opponent.
    pub fn shots(&self) -> &Board {
        &self.shots
    }

    pub fn ships(&self) -> &ShipRegistry {
        &self.ships
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Ships already announced as sunk.
    pub fn sunk_ships(&self) -> &[Ship] {
        &self.sunk
    }

    /// Record every ship that is fully HIT but not yet announced and return
    /// their lengths. A second call without new hits returns nothing.
    pub fn check_newly_sunk(&mut self) -> Vec<u8> {
        let newly: Vec<Ship> = self
            .ships
            .iter()
            .filter(|s| !self.sunk.contains(s) && s.is_sunk_on(&self.board))
            .cloned()
            .collect();
        let lengths = newly.iter().map(Ship::len).collect();
        self.sunk.extend(newly);
        lengths
    }

    fn clear_fleet(&mut self) -> bool {
        let removed = self.ships.drain();
        for ship in &removed {
            self.board.remove_ship(ship.cells());
        }
        self.ready = false;
        !removed.is_empty()
    }
}

/// True iff every coordinate of every ship in `ships` is HIT on `board`.
pub fn all_ships_sunk(ships: &ShipRegistry, board: &Board) -> bool {
    ships.iter().all(|s| s.is_sunk_on(board))
}

/// Resolve a shot at `at` against `defender`, mirroring the result into the
/// shooter's `shot_log`. Exactly two cells change on success.
pub fn resolve_shot(
    defender: &mut Participant,
    shot_log: &mut Board,
    at: Coord,
) -> Result<FireOutcome, EngineError> {
    if defender.board.cell(at).is_resolved() {
        return Err(EngineError::AlreadyFired);
    }
    let outcome = if defender.ships.ship_at(at).is_some() {
        FireOutcome::Hit
    } else {
        FireOutcome::Miss
    };
    debug_assert_eq!(
        outcome == FireOutcome::Hit,
        defender.board.cell(at) == Cell::Ship,
        "ship registry and board disagree at {}",
        at
    );
    defender.board.mark(at, outcome);
    shot_log.mark(at, outcome);
    debug_assert_eq!(defender.board.cell(at), shot_log.cell(at));
    Ok(outcome)
}

/// Result of a successful `fire`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub outcome: FireOutcome,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    id: SessionId,
    fleet: FleetRequirement,
    turn_policy: TurnPolicy,
    /// Seat 0 is the initiator, seat 1 the challenged participant.
    players: [Participant; 2],
    phase: Phase,
    turn: Option<usize>,
    winner: Option<usize>,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        initiator: PlayerId,
        challenged: PlayerId,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        if initiator == challenged {
            return Err(EngineError::SelfPlay);
        }
        Ok(Self {
            id,
            fleet: config.fleet.clone(),
            turn_policy: config.turn_policy,
            players: [Participant::new(initiator), Participant::new(challenged)],
            phase: Phase::Placement,
            turn: None,
            winner: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fleet(&self) -> &FleetRequirement {
        &self.fleet
    }

    pub fn turn_policy(&self) -> TurnPolicy {
        self.turn_policy
    }

    pub fn initiator(&self) -> &PlayerId {
        &self.players[0].id
    }

    pub fn challenged(&self) -> &PlayerId {
        &self.players[1].id
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.players
    }

    pub fn participant(&self, who: &PlayerId) -> Option<&Participant> {
        self.players.iter().find(|p| &p.id == who)
    }

    pub fn opponent_of(&self, who: &PlayerId) -> Option<&PlayerId> {
        let seat = self.seat(who).ok()?;
        Some(&self.players[1 - seat].id)
    }

    pub fn turn_holder(&self) -> Option<&PlayerId> {
        self.turn.map(|s| &self.players[s].id)
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.map(|s| &self.players[s].id)
    }

    pub fn loser(&self) -> Option<&PlayerId> {
        self.winner.map(|s| &self.players[1 - s].id)
    }

    fn seat(&self, who: &PlayerId) -> Result<usize, EngineError> {
        self.players
            .iter()
            .position(|p| &p.id == who)
            .ok_or(EngineError::NotAParticipant)
    }

    fn placement_seat(&self, who: &PlayerId) -> Result<usize, EngineError> {
        let seat = self.seat(who)?;
        if self.phase != Phase::Placement {
            return Err(EngineError::WrongPhase);
        }
        Ok(seat)
    }

    fn fleet_changed(&self, seat: usize) -> Event {
        let p = &self.players[seat];
        Event::BoardChanged {
            session: self.id,
            participant: p.id.clone(),
            view: BoardView::Fleet,
            board: p.board.snapshot(),
        }
    }

    fn shots_changed(&self, seat: usize) -> Event {
        let p = &self.players[seat];
        Event::BoardChanged {
            session: self.id,
            participant: p.id.clone(),
            view: BoardView::Shots,
            board: p.shots.snapshot(),
        }
    }

    /// Place one ship of `length` for `who`.
    pub fn place_ship(
        &mut self,
        who: &PlayerId,
        length: u8,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<Vec<Event>, EngineError> {
        let seat = self.placement_seat(who)?;
        if !self.fleet.is_recognized(length) {
            return Err(EngineError::InvalidShipLength(length));
        }
        let p = &mut self.players[seat];
        if p.ships.count(length) >= self.fleet.required(length) as usize {
            return Err(EngineError::FleetFull(length));
        }
        let coords = check_placement(&p.board, origin, length, orientation)?;
        let ship = Ship::from_cells(coords).ok_or(EngineError::OutOfBounds)?;
        p.board.place_ship(ship.cells());
        p.ships.add(ship);
        debug!(
            "session {}: {} placed length {} at {} facing {:?}",
            self.id, who, length, origin, orientation
        );
        Ok(vec![self.fleet_changed(seat)])
    }

    /// Remove the most recently placed ship of `length`. The fleet is no
    /// longer complete, so readiness is cleared.
    pub fn remove_ship(&mut self, who: &PlayerId, length: u8) -> Result<Vec<Event>, EngineError> {
        let seat = self.placement_seat(who)?;
        if !self.fleet.is_recognized(length) {
            return Err(EngineError::InvalidShipLength(length));
        }
        let p = &mut self.players[seat];
        let ship = p.ships.pop(length).ok_or(EngineError::NoShipToRemove(length))?;
        p.board.remove_ship(ship.cells());
        p.ready = false;
        debug!("session {}: {} removed a length {} ship", self.id, who, length);
        Ok(vec![self.fleet_changed(seat)])
    }

    /// Clear all of `who`'s ships and readiness. The phase stays PLACEMENT.
    pub fn reset_ships(&mut self, who: &PlayerId) -> Result<Vec<Event>, EngineError> {
        let seat = self.placement_seat(who)?;
        let removed_any = self.players[seat].clear_fleet();
        debug!("session {}: {} reset their fleet", self.id, who);
        if removed_any {
            Ok(vec![self.fleet_changed(seat)])
        } else {
            Ok(Vec::new())
        }
    }

    /// Lock in `who`'s fleet. When the second participant becomes ready the
    /// session enters FIRING in the same call, with the challenged
    /// participant holding the first turn.
    pub fn finish_placement(&mut self, who: &PlayerId) -> Result<Vec<Event>, EngineError> {
        let seat = self.placement_seat(who)?;
        let p = &mut self.players[seat];
        if !p.ships.satisfies(&self.fleet) {
            return Err(EngineError::IncompleteFleet);
        }
        if p.ready {
            return Ok(Vec::new());
        }
        p.ready = true;
        let mut events = vec![Event::PlacementReady {
            session: self.id,
            participant: who.clone(),
        }];
        if self.players.iter().all(|p| p.ready) {
            debug_assert!(
                self.players.iter().all(|p| p.ships.satisfies(&self.fleet)),
                "leaving placement with an incomplete fleet"
            );
            self.phase = Phase::Firing;
            self.turn = Some(1);
            debug!("session {}: firing phase, {} moves first", self.id, self.players[1].id);
            events.push(Event::TurnChanged {
                session: self.id,
                holder: self.players[1].id.clone(),
            });
        }
        Ok(events)
    }

    /// Fire at `target` (e.g. `"B7"`) on the opponent's board.
    pub fn fire(&mut self, shooter: &PlayerId, target: &str) -> Result<FireReport, EngineError> {
        let me = self.seat(shooter)?;
        if self.phase != Phase::Firing {
            return Err(EngineError::WrongPhase);
        }
        if self.turn != Some(me) {
            return Err(EngineError::NotYourTurn);
        }
        let at: Coord = target.parse()?;
        let foe = 1 - me;

        let [first, second] = &mut self.players;
        let (attacker, defender) = if me == 0 {
            (first, second)
        } else {
            (second, first)
        };
        let outcome = resolve_shot(defender, &mut attacker.shots, at)?;
        let newly_sunk = match outcome {
            FireOutcome::Hit => defender.check_newly_sunk(),
            FireOutcome::Miss => Vec::new(),
        };
        let defeated = outcome == FireOutcome::Hit && all_ships_sunk(&defender.ships, &defender.board);
        debug!("session {}: {} fired at {}: {:?}", self.id, shooter, at, outcome);

        let mut events = vec![self.fleet_changed(foe), self.shots_changed(me)];
        let defender_id = self.players[foe].id.clone();
        events.extend(newly_sunk.into_iter().map(|length| Event::ShipSunk {
            session: self.id,
            owner: defender_id.clone(),
            length,
        }));

        if defeated {
            self.phase = Phase::Completed;
            self.turn = None;
            self.winner = Some(me);
            debug!("session {}: {} sank the last ship of {}", self.id, shooter, defender_id);
            events.push(Event::GameOver {
                session: self.id,
                winner: shooter.clone(),
                loser: defender_id,
            });
            return Ok(FireReport { outcome, events });
        }

        let next = match (self.turn_policy, outcome) {
            (TurnPolicy::HitKeepsTurn, FireOutcome::Hit) => me,
            _ => foe,
        };
        if next != me {
            self.turn = Some(next);
            events.push(Event::TurnChanged {
                session: self.id,
                holder: self.players[next].id.clone(),
            });
        }
        Ok(FireReport { outcome, events })
    }

    /// End the session without a winner. Returns `false` if it was already over.
    pub fn abandon(&mut self) -> bool {
        if self.phase == Phase::Completed {
            return false;
        }
        self.phase = Phase::Completed;
        self.turn = None;
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            fleet: self.fleet.clone(),
            turn_policy: self.turn_policy,
            players: [
                ParticipantSnapshot::from(&self.players[0]),
                ParticipantSnapshot::from(&self.players[1]),
            ],
            phase: self.phase,
            turn: self.turn_holder().cloned(),
            winner: self.winner().cloned(),
        }
    }

    /// Rebuild a session from a snapshot, rejecting snapshots that break any
    /// board or fleet invariant.
    pub fn restore(snapshot: SessionSnapshot) -> anyhow::Result<Self> {
        let SessionSnapshot {
            id,
            fleet,
            turn_policy,
            players,
            phase,
            turn,
            winner,
        } = snapshot;
        let [a, b] = players;
        anyhow::ensure!(a.id != b.id, "snapshot seats the same player twice");
        let players = [a.into_participant()?, b.into_participant()?];

        for p in &players {
            anyhow::ensure!(
                p.ships.within(&fleet),
                "{} has more ships than the fleet allows",
                p.id
            );
            anyhow::ensure!(
                !p.ready || p.ships.satisfies(&fleet),
                "{} is ready without a complete fleet",
                p.id
            );
        }

        for seat in 0..2 {
            let (own, other) = (&players[seat], &players[1 - seat]);
            anyhow::ensure!(
                own.board.hits() == other.shots.hits() && own.board.misses() == other.shots.misses(),
                "shot log of {} does not mirror the board of {}",
                other.id,
                own.id
            );
        }

        let seat_of = |who: &PlayerId| {
            players
                .iter()
                .position(|p| &p.id == who)
                .ok_or_else(|| anyhow::anyhow!("{} is not seated in this session", who))
        };
        let turn = turn.as_ref().map(seat_of).transpose()?;
        let winner = winner.as_ref().map(seat_of).transpose()?;

        let fleets_locked = players.iter().all(|p| p.ready);
        match phase {
            Phase::Placement => anyhow::ensure!(
                turn.is_none() && winner.is_none() && players.iter().all(|p| p.board.shots_resolved() == 0),
                "placement snapshot carries shots or a turn"
            ),
            Phase::Firing => anyhow::ensure!(
                fleets_locked && turn.is_some() && winner.is_none(),
                "firing snapshot needs two locked fleets, a turn holder and no winner"
            ),
            Phase::Completed => anyhow::ensure!(
                turn.is_none() && (winner.is_none() || fleets_locked),
                "completed snapshot has a turn holder or a winner without fleets"
            ),
        }

        Ok(Self {
            id,
            fleet,
            turn_policy,
            players,
            phase,
            turn,
            winner,
        })
    }
}

/// Serializable state of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: PlayerId,
    pub board: BoardState,
    pub shots: BoardState,
    pub ships: ShipRegistry,
    pub ready: bool,
    pub sunk: Vec<Ship>,
}

impl From<&Participant> for ParticipantSnapshot {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            board: BoardState::from(&p.board),
            shots: BoardState::from(&p.shots),
            ships: p.ships.clone(),
            ready: p.ready,
            sunk: p.sunk.clone(),
        }
    }
}

impl ParticipantSnapshot {
    fn into_participant(self) -> anyhow::Result<Participant> {
        let board = Board::from(self.board);
        let shots = Board::from(self.shots);

        anyhow::ensure!(
            self.ships.is_consistent(),
            "ship registry of {} files ships under the wrong length",
            self.id
        );
        let mut occupied = crate::bitboard::Grid::new();
        for ship in self.ships.iter() {
            for &c in ship.cells() {
                anyhow::ensure!(!occupied.get(c), "ships of {} overlap at {}", self.id, c);
                occupied.set(c);
            }
        }
        anyhow::ensure!(
            occupied == board.ship_map(),
            "ship registry of {} does not match its board",
            self.id
        );
        anyhow::ensure!(
            (board.hits() & board.misses()).is_empty(),
            "board of {} marks a cell both hit and missed",
            self.id
        );
        anyhow::ensure!(
            (board.hits() & !board.ship_map()).is_empty() && (board.misses() & board.ship_map()).is_empty(),
            "board of {} has hits off ships or misses on ships",
            self.id
        );
        anyhow::ensure!(shots.ship_map().is_empty(), "shot log of {} holds ships", self.id);
        for ship in &self.sunk {
            anyhow::ensure!(
                self.ships.iter().any(|s| s == ship) && ship.is_sunk_on(&board),
                "announced sunk ship {:?} of {} is not sunk",
                ship.cells(),
                self.id
            );
        }

        Ok(Participant {
            id: self.id,
            board,
            shots,
            ships: self.ships,
            ready: self.ready,
            sunk: self.sunk,
        })
    }
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub fleet: FleetRequirement,
    pub turn_policy: TurnPolicy,
    pub players: [ParticipantSnapshot; 2],
    pub phase: Phase,
    pub turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
}

impl SessionSnapshot {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
