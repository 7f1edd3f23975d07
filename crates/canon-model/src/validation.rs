//! Validation results exchanged with the terminology registry and the
//! issue sink.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

/// Where in a resource an issue was found (e.g. `Observation` / `code`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationContext {
    pub element: String,
    pub field: String,
}

impl LocationContext {
    pub fn new(element: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            field: field.into(),
        }
    }
}

/// Extra context attached to an issue, such as the concept map consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    pub registry_entry_id: String,
    pub value_set_name: Option<String>,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Machine-readable code (e.g. "NOV_CONMAP_LOOKUP").
    pub code: String,
    pub description: String,
    pub location: LocationContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<IssueMetadata>>,
}

impl ValidationIssue {
    pub fn error(
        code: impl Into<String>,
        description: impl Into<String>,
        location: LocationContext,
    ) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            description: description.into(),
            location,
            metadata: None,
        }
    }

    pub fn warning(
        code: impl Into<String>,
        description: impl Into<String>,
        location: LocationContext,
    ) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(code, description, location)
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<IssueMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Accumulated validation issues for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    issues: Vec<ValidationIssue>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn merge(&mut self, other: Validation) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    /// Copy keeping only error-severity issues.
    pub fn errors_only(&self) -> Validation {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .cloned()
            .collect()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }
}

impl FromIterator<ValidationIssue> for Validation {
    fn from_iter<I: IntoIterator<Item = ValidationIssue>>(iter: I) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}
