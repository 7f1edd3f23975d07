//! Mapping stage: terminology lookup and the continue-or-abort decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use canon_model::{
    LocationContext, PipelineOptions, Resource, Tenant, Validation, ValidationIssue,
};

use crate::registry::TerminologyRegistry;
use crate::sink::{IssueSink, submit_issues};

/// Issue code raised when the registry itself cannot be reached.
pub const REGISTRY_FAILURE: &str = "NOV_REGISTRY_FAILURE";

/// Result of the mapping stage for one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingOutcome {
    /// Continue with this resource; warnings, if any, were reported.
    Continue(Resource),
    /// Blocking issues were found and reported.
    Abort { report_id: Option<String> },
}

/// Calls the terminology registry and interprets its validation result.
pub struct MappingStage {
    registry: Arc<dyn TerminologyRegistry>,
    sink: Arc<dyn IssueSink>,
    options: PipelineOptions,
}

impl MappingStage {
    pub fn new(
        registry: Arc<dyn TerminologyRegistry>,
        sink: Arc<dyn IssueSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            registry,
            sink,
            options,
        }
    }

    pub fn registry(&self) -> &Arc<dyn TerminologyRegistry> {
        &self.registry
    }

    pub fn sink(&self) -> &Arc<dyn IssueSink> {
        &self.sink
    }

    pub fn map(
        &self,
        resource: &Resource,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> MappingOutcome {
        let result = match self.registry.map_resource(resource, tenant, force_reload) {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(error = %error, "terminology registry lookup failed");
                let validation: Validation = [ValidationIssue::error(
                    REGISTRY_FAILURE,
                    format!("Terminology registry lookup failed: {error}"),
                    LocationContext::new(resource.resource_type(), ""),
                )]
                .into_iter()
                .collect();
                let report_id =
                    submit_issues(self.sink.as_ref(), &validation, resource, tenant.mnemonic());
                return MappingOutcome::Abort { report_id };
            }
        };

        let validation = result.validation;
        // Issues are reported against the best resource available.
        let best = result.resource.unwrap_or_else(|| resource.clone());

        if self.is_blocking(&validation) {
            tracing::debug!(
                errors = validation.error_count(),
                warnings = validation.warning_count(),
                "mapping found blocking issues"
            );
            let report_id = submit_issues(self.sink.as_ref(), &validation, &best, tenant.mnemonic());
            return MappingOutcome::Abort { report_id };
        }
        if validation.has_issues() && self.options.report_warnings {
            submit_issues(self.sink.as_ref(), &validation, &best, tenant.mnemonic());
        }
        MappingOutcome::Continue(best)
    }

    fn is_blocking(&self, validation: &Validation) -> bool {
        validation.has_errors()
            || (self.options.warnings_are_blocking && validation.warning_count() > 0)
    }
}
