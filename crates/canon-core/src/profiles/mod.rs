//! Profile transformers and their registry.

pub mod common;
pub mod condition;
pub mod medication;
pub mod observation;
pub mod patient;
pub mod transformer;

pub use transformer::{
    Dispatch, ProfileRegistry, ProfileTransformer, TransformOutput, TransformResponse,
    build_default_registry,
};
