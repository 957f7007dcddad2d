//! Domain-level validation errors.

use thiserror::Error;

use super::state::RunState;
use super::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRunId {
    #[error("run id must not be empty")]
    Empty,

    #[error("run id {value:?} contains illegal character {ch:?}")]
    IllegalCharacter { value: String, ch: char },

    #[error("run id {0:?} is not a YYYYMMDD date")]
    NotADate(String),
}

/// A state-machine event that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} from state {from}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub event: TransitionEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    Start(Stage),
    Fail,
    Finish,
}

impl std::fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start(stage) => write!(f, "start {stage}"),
            Self::Fail => f.write_str("fail"),
            Self::Finish => f.write_str("finish"),
        }
    }
}
