//! Issue sinks receiving validation results.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use sha2::{Digest, Sha256};

use canon_model::{IssueSeverity, Resource, Validation, ValidationIssue};

/// Destination for validation issues raised while transforming a resource.
pub trait IssueSink: Send + Sync {
    /// Records `validation` against `resource` and returns a report id.
    fn report_issues(
        &self,
        validation: &Validation,
        resource: &Resource,
        tenant: &str,
    ) -> anyhow::Result<String>;
}

/// Reports `validation`, logging (not propagating) sink failures.
pub fn submit_issues(
    sink: &dyn IssueSink,
    validation: &Validation,
    resource: &Resource,
    tenant: &str,
) -> Option<String> {
    match sink.report_issues(validation, resource, tenant) {
        Ok(report_id) => {
            tracing::debug!(
                report_id = %report_id,
                errors = validation.error_count(),
                warnings = validation.warning_count(),
                "issues reported"
            );
            Some(report_id)
        }
        Err(error) => {
            tracing::warn!(
                resource_type = resource.resource_type(),
                error = %error,
                "failed to report issues"
            );
            None
        }
    }
}

/// Deterministic id for a report: SHA-256 over tenant, resource and issue
/// codes, hex encoded and shortened.
pub fn report_id(validation: &Validation, resource: &Resource, tenant: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tenant.as_bytes());
    hasher.update([0]);
    hasher.update(resource.resource_type().as_bytes());
    hasher.update([0]);
    hasher.update(resource.id().unwrap_or_default().as_bytes());
    for issue in validation.issues() {
        hasher.update([0]);
        hasher.update(issue.code.as_bytes());
        hasher.update(issue.location.element.as_bytes());
        hasher.update(issue.location.field.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// A validation result as recorded by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub id: String,
    pub tenant: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl IssueReport {
    pub fn new(validation: &Validation, resource: &Resource, tenant: &str) -> Self {
        Self {
            id: report_id(validation, resource, tenant),
            tenant: tenant.to_string(),
            resource_type: resource.resource_type().to_string(),
            resource_id: resource.id().map(str::to_string),
            issues: validation.issues().to_vec(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Error)
    }
}

/// Writes every issue to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingIssueSink;

impl IssueSink for LoggingIssueSink {
    fn report_issues(
        &self,
        validation: &Validation,
        resource: &Resource,
        tenant: &str,
    ) -> anyhow::Result<String> {
        let report_id = report_id(validation, resource, tenant);
        for issue in validation.issues() {
            match issue.severity {
                IssueSeverity::Error => tracing::error!(
                    report_id = %report_id,
                    tenant,
                    code = %issue.code,
                    element = %issue.location.element,
                    field = %issue.location.field,
                    "{}",
                    issue.description
                ),
                IssueSeverity::Warning => tracing::warn!(
                    report_id = %report_id,
                    tenant,
                    code = %issue.code,
                    element = %issue.location.element,
                    field = %issue.location.field,
                    "{}",
                    issue.description
                ),
                IssueSeverity::Info => tracing::info!(
                    report_id = %report_id,
                    tenant,
                    code = %issue.code,
                    "{}",
                    issue.description
                ),
            }
        }
        Ok(report_id)
    }
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct MemoryIssueSink {
    reports: Mutex<Vec<IssueReport>>,
}

impl MemoryIssueSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reports recorded so far.
    pub fn reports(&self) -> Vec<IssueReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IssueSink for MemoryIssueSink {
    fn report_issues(
        &self,
        validation: &Validation,
        resource: &Resource,
        tenant: &str,
    ) -> anyhow::Result<String> {
        let report = IssueReport::new(validation, resource, tenant);
        let id = report.id.clone();
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
        Ok(id)
    }
}
