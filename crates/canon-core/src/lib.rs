//! Profile transformers and the per-resource transformation pipeline.
//!
//! - **profiles**: the profile transformer trait, registry and catalog
//! - **pipeline**: the stage machine that normalizes, maps, profiles and
//!   localizes one resource, plus parallel batch execution

pub mod pipeline;
pub mod profiles;

pub use pipeline::{AbortReason, PipelineOutcome, PipelineRun, Stage, TransformManager};
pub use profiles::{
    Dispatch, ProfileRegistry, ProfileTransformer, TransformOutput, TransformResponse,
    build_default_registry,
};
