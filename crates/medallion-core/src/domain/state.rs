//! RunState - 1 回の実行の状態
//!
//! # 状態遷移
//! ```text
//! NotStarted → Running(Bronze) → Failed(Bronze)
//!                              → Running(Silver) → Failed(Silver)
//!                                                → Running(Gold) → Failed(Gold)
//!                                                                → Succeeded
//! ```
//! `Failed(_)` と `Succeeded` は終端。skip / partial-continue は無い。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{InvalidTransition, TransitionEvent};
use super::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running(Stage),
    Failed(Stage),
    Succeeded,
}

impl RunState {
    /// Begin `stage`. Only legal as the very first step (bronze) or directly
    /// after its upstream stage completed successfully.
    pub fn start(self, stage: Stage) -> Result<Self, InvalidTransition> {
        let allowed = match self {
            Self::NotStarted => stage.upstream().is_none(),
            Self::Running(current) => current.downstream() == Some(stage),
            Self::Failed(_) | Self::Succeeded => false,
        };
        if allowed {
            Ok(Self::Running(stage))
        } else {
            Err(self.reject(TransitionEvent::Start(stage)))
        }
    }

    /// Mark the running stage as failed. Only valid while a stage runs.
    pub fn fail(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Running(stage) => Ok(Self::Failed(stage)),
            _ => Err(self.reject(TransitionEvent::Fail)),
        }
    }

    /// Complete the run after the last stage succeeded.
    pub fn finish(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Running(stage) if stage.downstream().is_none() => Ok(Self::Succeeded),
            _ => Err(self.reject(TransitionEvent::Finish)),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed(_) | Self::Succeeded)
    }

    pub fn failed_stage(self) -> Option<Stage> {
        match self {
            Self::Failed(stage) => Some(stage),
            _ => None,
        }
    }

    fn reject(self, event: TransitionEvent) -> InvalidTransition {
        InvalidTransition { from: self, event }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not_started"),
            Self::Running(stage) => write!(f, "{stage}_running"),
            Self::Failed(stage) => write!(f, "{stage}_failed"),
            Self::Succeeded => f.write_str("succeeded"),
        }
    }
}
