//! Submission planning
//!
//! Turns a raw form payload, its screen context, the optional edit mask and the
//! loaded code books into an ordered [`SubmissionPlan`] of [`WriteStep`]s. Nothing
//! in this module performs I/O; the pipeline executes what is planned here.

pub mod compose;
pub mod context;
pub mod fields;
pub mod lookup;
pub mod profit;
pub mod step;

pub use compose::PlanComposer;
pub use context::{ContextKind, ScreenContext};
pub use fields::{EditMask, FieldRules};
pub use lookup::{CodeBook, LookupTables};
pub use profit::{compute_profit, MarginMode};
pub use step::{
    ChildWrite, IdSource, NestedWrite, RelationKey, StepAction, StepKind, SubmissionPlan,
    WriteStep,
};
