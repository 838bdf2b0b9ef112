//! Commonly used types for host integrations.

pub use crate::{
    Action, ActionReport, Coord, EngineConfig, EngineError, Event, FireOutcome, GameSession,
    Orientation, PairKey, Phase, PlayerId, SessionRegistry,
};
