//! Stage: the three medallion layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One layer of the pipeline. The derive order is the precedence order.
///
/// A stage is a behavior selector only; nothing about it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Bronze,
    Silver,
    Gold,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Bronze, Stage::Silver, Stage::Gold];

    /// Task name used in logs and summaries.
    pub fn task_id(self) -> &'static str {
        match self {
            Self::Bronze => "bronze_layer",
            Self::Silver => "silver_layer",
            Self::Gold => "gold_layer",
        }
    }

    /// Transformation-tool command tokens, or `None` for the in-process bronze step.
    ///
    /// Gold runs `test`, not `run`: it validates artifacts silver already built.
    pub fn tool_command(self) -> Option<&'static str> {
        match self {
            Self::Bronze => None,
            Self::Silver => Some("run --select tag:silver"),
            Self::Gold => Some("test --select tag:gold"),
        }
    }

    /// Only gold leaves a quality report behind.
    pub fn writes_quality_report(self) -> bool {
        matches!(self, Self::Gold)
    }

    /// Stage this one waits for in the linear medallion chain.
    pub fn upstream(self) -> Option<Stage> {
        match self {
            Self::Bronze => None,
            Self::Silver => Some(Self::Bronze),
            Self::Gold => Some(Self::Silver),
        }
    }

    pub fn downstream(self) -> Option<Stage> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
