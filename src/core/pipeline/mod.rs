mod context;
mod filters;
mod machine;
mod stage;

pub use filters::FilterReport;
pub use machine::{NavigationMachine, PipelineResult};
pub use stage::{AbortReason, Stage, StageOutcome};
