//! Stage descriptors, output layout and sequential orchestration.

pub mod layout;
pub mod orchestrator;
pub mod runner;
pub mod stage;
pub mod survival;
pub mod variant;

pub use layout::OutputLayout;
pub use orchestrator::{Orchestrator, RunState};
pub use runner::{StageRunner, StageStatus, SystemRunner};
pub use stage::{AccessMode, BindMount, StageSpec};
pub use variant::PipelineVariant;
