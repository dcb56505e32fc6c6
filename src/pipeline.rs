//! Write pipeline
//!
//! Executes a [`SubmissionPlan`](crate::plan::SubmissionPlan) against a
//! [`ContentApi`](crate::client::ContentApi): steps run strictly in order, carried
//! identifiers flow forward, and a failed step halts everything after it.

pub mod executor;
pub mod result;

pub use executor::{CarriedIds, StagedWriteExecutor};
pub use result::{ChildOutcome, ExecutionResult, StepOutcome, StepStatus};
