//! CLI library components for the canon transformer.

pub mod batch;
pub mod logging;
