//! Batch input, output and per-type tallies for the `transform` command.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use canon_core::PipelineRun;
use canon_model::{Resource, TransformError};

/// Reads a JSON array of resources.
pub fn load_resources(path: &Path) -> Result<Vec<Resource>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parse resources from {}", path.display()))
}

/// Transformed resources and the resources extracted from them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BatchOutput {
    pub resources: Vec<Resource>,
    pub embedded: Vec<Resource>,
}

impl BatchOutput {
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("write {}", path.display()))
    }
}

/// Counts for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSummary {
    pub resource_type: &'static str,
    pub total: usize,
    pub transformed: usize,
    pub aborted: usize,
    pub embedded: usize,
}

/// Splits pipeline runs into output and per-type counts.
///
/// `runs` must be in the same order as `resources`. A contract violation in
/// any run fails the whole batch.
pub fn collect_runs(
    resources: &[Resource],
    runs: Vec<Result<PipelineRun, TransformError>>,
) -> Result<(BatchOutput, Vec<TypeSummary>)> {
    let mut output = BatchOutput::default();
    let mut summaries: BTreeMap<&'static str, TypeSummary> = BTreeMap::new();
    for (resource, run) in resources.iter().zip(runs) {
        let run = run.with_context(|| {
            format!(
                "transform {}",
                resource
                    .reference()
                    .unwrap_or_else(|| resource.resource_type().to_string())
            )
        })?;
        let resource_type = resource.resource_type();
        let summary = summaries.entry(resource_type).or_insert_with(|| TypeSummary {
            resource_type,
            ..TypeSummary::default()
        });
        summary.total += 1;
        match run.into_outcome() {
            Some(outcome) => {
                summary.transformed += 1;
                summary.embedded += outcome.embedded.len();
                output.resources.push(outcome.resource);
                output.embedded.extend(outcome.embedded);
            }
            None => summary.aborted += 1,
        }
    }
    Ok((output, summaries.into_values().collect()))
}
