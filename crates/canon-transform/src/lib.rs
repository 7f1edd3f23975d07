//! Clinical resource transformation.
//!
//! - **engine**: generic post-order walk with copy-on-write rebuild
//! - **normalization**: structural canonicalization rules
//! - **localization**: tenant-scoped id and reference rules
//! - **extract**: embedded medication extraction
//! - **extensions**: extension URLs shared by the rule sets

pub mod engine;
pub mod extensions;
pub mod extract;
pub mod localization;
pub mod normalization;

pub use engine::{Rewrite, Rule, rebuild, rebuild_resource, run, run_resource, transform_children};
pub use extract::{Extraction, codeable_id, extract_medication};
pub use localization::{LocalReference, Localizer, localize_id};
pub use normalization::Normalizer;
