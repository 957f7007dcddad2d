//! Domain model (ids, stages, run state, command results, quality reports).

pub mod command;
pub mod definition;
pub mod errors;
pub mod ids;
pub mod report;
pub mod stage;
pub mod state;

pub use command::{CommandResult, CommandSpec, ExecutionEnvironment};
pub use definition::PipelineDefinition;
pub use errors::{InvalidRunId, InvalidTransition, TransitionEvent};
pub use ids::{AttemptId, RunContext, RunId};
pub use report::{QualityReport, QualityStatus};
pub use stage::Stage;
pub use state::RunState;
