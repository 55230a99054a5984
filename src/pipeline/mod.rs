//! The concurrent import pipeline: reader → decode workers → insertion
//! workers, coordinated by [`coordinator::PipelineCoordinator`].

pub mod batch;
pub mod coordinator;
pub mod decode;
pub mod progress;
pub mod state;

pub use coordinator::{PipelineCoordinator, PipelineOutcome};
pub use progress::ProgressTracker;
pub use state::PipelineState;
