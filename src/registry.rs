//! All active sessions, keyed by the unordered pair of participants.
//!
//! Locking: the index (pair → session, player → pair) sits behind one
//! short-held mutex that is only taken for lookups and insert/remove. Each
//! session has its own mutex, so unrelated games never contend and actions
//! on one game serialize. Neither lock is held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::common::{Coord, EngineError, FireOutcome};
use crate::config::EngineConfig;
use crate::events::Event;
use crate::game::{GameSession, PlayerId, SessionId};
use crate::ledger::Ledger;
use crate::ship::Orientation;

pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Lock a session, recovering the guard if a previous holder panicked.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, GameSession> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unordered pair of identities; `{a, b}` and `{b, a}` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(PlayerId, PlayerId);

impl PairKey {
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }

    pub fn contains(&self, who: &PlayerId) -> bool {
        &self.0 == who || &self.1 == who
    }
}

/// Typed inbound actions from the host, applied to the sender's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    PlaceShip {
        length: u8,
        origin: Coord,
        orientation: Orientation,
    },
    RemoveShip {
        length: u8,
    },
    ResetShips,
    FinishPlacement,
    Fire {
        target: String,
    },
}

/// What an accepted action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub session: SessionId,
    /// Set for `Fire`.
    pub shot: Option<FireOutcome>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GameResult {
    session: SessionId,
    winner: PlayerId,
    loser: PlayerId,
}

#[derive(Default)]
struct Index {
    sessions: HashMap<PairKey, SessionHandle>,
    players: HashMap<PlayerId, PairKey>,
}

impl Index {
    fn remove(&mut self, pair: &PairKey) -> Option<SessionHandle> {
        let handle = self.sessions.remove(pair)?;
        self.players.remove(&pair.0);
        self.players.remove(&pair.1);
        Some(handle)
    }
}

pub struct SessionRegistry {
    config: EngineConfig,
    index: Mutex<Index>,
    next_id: AtomicU64,
    ledger: Option<Arc<dyn Ledger>>,
}

impl SessionRegistry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            index: Mutex::new(Index::default()),
            next_id: AtomicU64::new(1),
            ledger: None,
        }
    }

    /// Settle finished games against `ledger`.
    pub fn with_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn index(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.index().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a session between `initiator` and `challenged`. Each identity
    /// may be in at most one active session.
    pub fn start_session(
        &self,
        initiator: PlayerId,
        challenged: PlayerId,
    ) -> Result<SessionHandle, EngineError> {
        if initiator == challenged {
            return Err(EngineError::SelfPlay);
        }
        let pair = PairKey::new(initiator.clone(), challenged.clone());
        let mut index = self.index();
        if index.sessions.contains_key(&pair)
            || index.players.contains_key(&initiator)
            || index.players.contains_key(&challenged)
        {
            return Err(EngineError::AlreadyActive);
        }
        let id = SessionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = GameSession::new(id, initiator.clone(), challenged.clone(), &self.config)?;
        let handle = Arc::new(Mutex::new(session));
        index.sessions.insert(pair.clone(), Arc::clone(&handle));
        index.players.insert(initiator.clone(), pair.clone());
        index.players.insert(challenged.clone(), pair);
        info!("session {}: {} challenged {}", id, initiator, challenged);
        Ok(handle)
    }

    /// Register a session rebuilt elsewhere (e.g. from a snapshot).
    pub fn adopt(&self, session: GameSession) -> Result<SessionHandle, EngineError> {
        let (a, b) = (session.initiator().clone(), session.challenged().clone());
        let pair = PairKey::new(a.clone(), b.clone());
        let mut index = self.index();
        if index.sessions.contains_key(&pair) || index.players.contains_key(&a) || index.players.contains_key(&b) {
            return Err(EngineError::AlreadyActive);
        }
        self.next_id.fetch_max(session.id().0 + 1, Ordering::SeqCst);
        info!("session {}: adopted for {} and {}", session.id(), a, b);
        let handle = Arc::new(Mutex::new(session));
        index.sessions.insert(pair.clone(), Arc::clone(&handle));
        index.players.insert(a, pair.clone());
        index.players.insert(b, pair);
        Ok(handle)
    }

    /// The active session containing `player`, if any.
    pub fn session_for(&self, player: &PlayerId) -> Option<SessionHandle> {
        let index = self.index();
        let pair = index.players.get(player)?;
        index.sessions.get(pair).cloned()
    }

    pub fn find(&self, pair: &PairKey) -> Option<SessionHandle> {
        self.index().sessions.get(pair).cloned()
    }

    /// Abandon and remove the session for `pair`, freeing both players.
    pub fn end_session(&self, pair: &PairKey) -> Result<(), EngineError> {
        let handle = self.index().remove(pair).ok_or(EngineError::NoActiveSession)?;
        let mut session = lock_session(&handle);
        if session.abandon() {
            info!("session {}: abandoned", session.id());
        }
        Ok(())
    }

    /// Apply `action` on behalf of `player` to their active session.
    pub async fn route_action(
        &self,
        player: &PlayerId,
        action: Action,
    ) -> Result<ActionReport, EngineError> {
        let (pair, handle) = {
            let index = self.index();
            let pair = index
                .players
                .get(player)
                .cloned()
                .ok_or(EngineError::NoActiveSession)?;
            let handle = index
                .sessions
                .get(&pair)
                .cloned()
                .ok_or(EngineError::NoActiveSession)?;
            (pair, handle)
        };

        let (report, result) = match apply(&handle, player, action) {
            Ok(applied) => applied,
            Err(e) => {
                debug!("{} rejected: {}", player, e);
                return Err(e);
            }
        };

        if let Some(result) = result {
            self.retire(&pair, &handle);
            self.settle(&result).await;
        }
        Ok(report)
    }

    /// Remove `pair` if it still maps to `handle`.
    fn retire(&self, pair: &PairKey, handle: &SessionHandle) {
        let mut index = self.index();
        let current = index.sessions.get(pair).is_some_and(|h| Arc::ptr_eq(h, handle));
        if current {
            index.remove(pair);
        }
    }

    async fn settle(&self, result: &GameResult) {
        info!(
            "session {}: {} beat {}",
            result.session, result.winner, result.loser
        );
        let Some(ledger) = &self.ledger else {
            return;
        };
        if let Err(e) = ledger.credit(&result.winner, self.config.win_reward).await {
            warn!("session {}: crediting {} failed: {}", result.session, result.winner, e);
        }
        if let Err(e) = ledger.debit(&result.loser, self.config.loss_penalty).await {
            warn!("session {}: debiting {} failed: {}", result.session, result.loser, e);
        }
        if let Err(e) = ledger.record_outcome(&result.winner, &result.loser).await {
            warn!("session {}: recording streaks failed: {}", result.session, e);
        }
    }
}

/// Run `action` with the session lock held for the whole check-and-mutate step.
fn apply(
    handle: &SessionHandle,
    player: &PlayerId,
    action: Action,
) -> Result<(ActionReport, Option<GameResult>), EngineError> {
    let mut session = lock_session(handle);
    let mut shot = None;
    let events = match action {
        Action::PlaceShip {
            length,
            origin,
            orientation,
        } => session.place_ship(player, length, origin, orientation)?,
        Action::RemoveShip { length } => session.remove_ship(player, length)?,
        Action::ResetShips => session.reset_ships(player)?,
        Action::FinishPlacement => session.finish_placement(player)?,
        Action::Fire { target } => {
            let report = session.fire(player, &target)?;
            shot = Some(report.outcome);
            report.events
        }
    };
    let result = events.iter().find_map(|e| match e {
        Event::GameOver {
            session,
            winner,
            loser,
        } => Some(GameResult {
            session: *session,
            winner: winner.clone(),
            loser: loser.clone(),
        }),
        _ => None,
    });
    Ok((
        ActionReport {
            session: session.id(),
            shot,
            events,
        },
        result,
    ))
}
