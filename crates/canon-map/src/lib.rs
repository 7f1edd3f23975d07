//! Terminology mapping for the transformation pipeline.
//!
//! - **registry**: the terminology registry interface
//! - **sink**: issue sinks and report ids
//! - **stage**: the mapping stage's continue-or-abort decision
//! - **concept_map**: a JSON-backed registry implementation

pub mod concept_map;
pub mod error;
pub mod registry;
pub mod sink;
pub mod stage;

pub use concept_map::{
    CONCEPT_MAP_LOOKUP, ConceptMap, ConceptMapDocument, ConceptMapEntry, ConceptMapRegistry,
    ValueSet,
};
pub use error::MappingError;
pub use registry::{MappingResult, PassthroughRegistry, TerminologyRegistry};
pub use sink::{
    IssueReport, IssueSink, LoggingIssueSink, MemoryIssueSink, report_id, submit_issues,
};
pub use stage::{MappingOutcome, MappingStage, REGISTRY_FAILURE};
