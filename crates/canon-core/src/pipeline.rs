//! Per-resource transformation pipeline.
//!
//! Every resource moves through a fixed sequence of stages:
//!
//! 1. **Normalizing** - canonical coding systems, derived text, empty values dropped
//! 2. **Mapping** - terminology registry lookup; blocking issues abort
//! 3. **ProfileTransforming** - profile dispatch; a failed transformer aborts
//! 4. **Localizing** - tenant-scoped ids and references
//!
//! An aborted resource yields no output. Its issues are sent to the issue
//! sink, and other resources in the same batch are unaffected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use canon_map::{IssueSink, MappingOutcome, MappingStage, TerminologyRegistry, submit_issues};
use canon_model::{PipelineOptions, Resource, Tenant, TransformError};
use canon_transform::{Localizer, Normalizer, run_resource};

use crate::profiles::{ProfileRegistry, TransformOutput};

/// A fully transformed resource and the resources extracted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub resource: Resource,
    pub embedded: Vec<Resource>,
}

/// Why a resource left the pipeline without output.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    /// The terminology registry reported blocking issues.
    Mapping { report_id: Option<String> },
    /// A qualified profile transformer could not produce a result.
    ProfileTransform {
        profile: &'static str,
        report_id: Option<String>,
    },
}

impl AbortReason {
    pub fn stage(&self) -> &'static str {
        match self {
            AbortReason::Mapping { .. } => "mapping",
            AbortReason::ProfileTransform { .. } => "profile_transforming",
        }
    }

    pub fn report_id(&self) -> Option<&str> {
        match self {
            AbortReason::Mapping { report_id } | AbortReason::ProfileTransform { report_id, .. } => {
                report_id.as_deref()
            }
        }
    }
}

/// Pipeline state for one resource. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Normalizing(Resource),
    Mapping(Resource),
    ProfileTransforming(Resource),
    Localizing(TransformOutput),
    Done(PipelineOutcome),
    Aborted(AbortReason),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Normalizing(_) => "normalizing",
            Stage::Mapping(_) => "mapping",
            Stage::ProfileTransforming(_) => "profile_transforming",
            Stage::Localizing(_) => "localizing",
            Stage::Done(_) => "done",
            Stage::Aborted(_) => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done(_) | Stage::Aborted(_))
    }
}

/// Result of running one resource, with the stages it passed through.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub result: Result<PipelineOutcome, AbortReason>,
    /// Names of the stages executed, in order.
    pub executed_stages: Vec<&'static str>,
}

impl PipelineRun {
    pub fn outcome(&self) -> Option<&PipelineOutcome> {
        self.result.as_ref().ok()
    }

    pub fn into_outcome(self) -> Option<PipelineOutcome> {
        self.result.ok()
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.result.as_ref().err()
    }
}

/// Runs resources through the transformation stages.
///
/// Holds no per-run state, so one manager can serve any number of runs in
/// parallel.
pub struct TransformManager {
    profiles: ProfileRegistry,
    mapping: MappingStage,
    sink: Arc<dyn IssueSink>,
    options: PipelineOptions,
}

impl TransformManager {
    pub fn new(
        profiles: ProfileRegistry,
        registry: Arc<dyn TerminologyRegistry>,
        sink: Arc<dyn IssueSink>,
        options: PipelineOptions,
    ) -> Self {
        let mapping = MappingStage::new(registry, Arc::clone(&sink), options.clone());
        Self {
            profiles,
            mapping,
            sink,
            options,
        }
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Transforms one resource. `Ok(None)` means the resource was aborted;
    /// `Err` is a schema or registration bug.
    pub fn transform_resource(
        &self,
        resource: &Resource,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Result<Option<PipelineOutcome>, TransformError> {
        Ok(self.execute(resource, tenant, force_reload)?.into_outcome())
    }

    /// Transforms one resource and records the stages it went through.
    pub fn execute(
        &self,
        resource: &Resource,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Result<PipelineRun, TransformError> {
        let span = tracing::info_span!(
            "transform",
            resource_type = resource.resource_type(),
            resource_id = resource.id().unwrap_or_default(),
            tenant = tenant.mnemonic(),
        );
        let _guard = span.enter();

        let mut executed_stages = Vec::with_capacity(4);
        let mut stage = Stage::Normalizing(resource.clone());
        let result = loop {
            stage = match stage {
                Stage::Done(outcome) => break Ok(outcome),
                Stage::Aborted(reason) => break Err(reason),
                active => {
                    executed_stages.push(active.name());
                    self.advance(active, tenant, force_reload)?
                }
            };
        };

        match &result {
            Ok(outcome) => {
                tracing::info!(embedded = outcome.embedded.len(), "resource transformed");
            }
            Err(reason) if self.options.warn_on_abort => {
                tracing::warn!(
                    stage = reason.stage(),
                    report_id = reason.report_id().unwrap_or_default(),
                    "resource aborted"
                );
            }
            Err(reason) => tracing::debug!(stage = reason.stage(), "resource aborted"),
        }
        Ok(PipelineRun {
            result,
            executed_stages,
        })
    }

    /// Transforms independent resources in parallel. Results keep input
    /// order.
    pub fn transform_batch(
        &self,
        resources: &[Resource],
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Vec<Result<Option<PipelineOutcome>, TransformError>> {
        resources
            .par_iter()
            .map(|resource| self.transform_resource(resource, tenant, force_reload))
            .collect()
    }

    /// [`TransformManager::execute`] over a batch, in parallel.
    pub fn execute_batch(
        &self,
        resources: &[Resource],
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Vec<Result<PipelineRun, TransformError>> {
        resources
            .par_iter()
            .map(|resource| self.execute(resource, tenant, force_reload))
            .collect()
    }

    fn advance(
        &self,
        stage: Stage,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Result<Stage, TransformError> {
        tracing::debug!(stage = stage.name(), "entering stage");
        match stage {
            Stage::Normalizing(resource) => Ok(Stage::Mapping(run_resource(
                &resource,
                tenant,
                &Normalizer,
            )?)),
            Stage::Mapping(resource) => {
                match self.mapping.map(&resource, tenant, force_reload) {
                    MappingOutcome::Continue(mapped) => Ok(Stage::ProfileTransforming(mapped)),
                    MappingOutcome::Abort { report_id } => {
                        Ok(Stage::Aborted(AbortReason::Mapping { report_id }))
                    }
                }
            }
            Stage::ProfileTransforming(resource) => self.profile_transform(&resource, tenant),
            Stage::Localizing(output) => Ok(Stage::Done(self.localize(output, tenant)?)),
            terminal @ (Stage::Done(_) | Stage::Aborted(_)) => Ok(terminal),
        }
    }

    fn profile_transform(&self, resource: &Resource, tenant: &Tenant) -> Result<Stage, TransformError> {
        let dispatch = self.profiles.dispatch(resource, tenant)?;
        tracing::debug!(profiles = ?dispatch.applied, "profiles applied");
        match dispatch.output {
            Some(output) => {
                // Errors from a successful dispatch are always reported.
                let reported = if self.options.report_warnings {
                    dispatch.validation
                } else {
                    dispatch.validation.errors_only()
                };
                if reported.has_issues() {
                    submit_issues(
                        self.sink.as_ref(),
                        &reported,
                        &output.resource,
                        tenant.mnemonic(),
                    );
                }
                Ok(Stage::Localizing(output))
            }
            None => {
                let report_id = submit_issues(
                    self.sink.as_ref(),
                    &dispatch.validation,
                    resource,
                    tenant.mnemonic(),
                );
                let profile = dispatch.applied.last().copied().unwrap_or_default();
                Ok(Stage::Aborted(AbortReason::ProfileTransform { profile, report_id }))
            }
        }
    }

    fn localize(
        &self,
        output: TransformOutput,
        tenant: &Tenant,
    ) -> Result<PipelineOutcome, TransformError> {
        let resource = run_resource(&output.resource, tenant, &Localizer)?;
        let embedded = if self.options.localize_embedded {
            output
                .embedded
                .iter()
                .map(|embedded| run_resource(embedded, tenant, &Localizer))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            output.embedded
        };
        Ok(PipelineOutcome { resource, embedded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages() {
        let aborted = Stage::Aborted(AbortReason::Mapping { report_id: None });
        assert!(aborted.is_terminal());
        assert_eq!(aborted.name(), "aborted");
        assert!(!Stage::Normalizing(Resource::Patient(Default::default())).is_terminal());
    }

    #[test]
    fn test_abort_reason_reports_stage() {
        let reason = AbortReason::ProfileTransform {
            profile: "http://example.org/profile",
            report_id: Some("abc".to_string()),
        };
        assert_eq!(reason.stage(), "profile_transforming");
        assert_eq!(reason.report_id(), Some("abc"));
    }
}
