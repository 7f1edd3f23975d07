use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use canon_map::{
    IssueSink, MappingOutcome, MappingResult, MappingStage, MemoryIssueSink, PassthroughRegistry,
    REGISTRY_FAILURE, TerminologyRegistry,
};
use canon_model::{
    Coding, Id, LocationContext, Patient, PipelineOptions, Resource, Tenant, Validation,
    ValidationIssue,
};

/// Registry returning a fixed validation result.
struct FixedRegistry {
    validation: Validation,
    mapped: Option<Resource>,
}

impl TerminologyRegistry for FixedRegistry {
    fn map_resource(
        &self,
        _resource: &Resource,
        _tenant: &Tenant,
        _force_reload: Option<DateTime<Utc>>,
    ) -> anyhow::Result<MappingResult> {
        Ok(MappingResult {
            resource: self.mapped.clone(),
            validation: self.validation.clone(),
        })
    }

    fn required_value_set(&self, _field_path: &str, _profile: &str) -> Vec<Coding> {
        Vec::new()
    }
}

struct OfflineRegistry;

impl TerminologyRegistry for OfflineRegistry {
    fn map_resource(
        &self,
        _resource: &Resource,
        _tenant: &Tenant,
        _force_reload: Option<DateTime<Utc>>,
    ) -> anyhow::Result<MappingResult> {
        Err(anyhow!("connection refused"))
    }

    fn required_value_set(&self, _field_path: &str, _profile: &str) -> Vec<Coding> {
        Vec::new()
    }
}

struct FailingSink;

impl IssueSink for FailingSink {
    fn report_issues(&self, _: &Validation, _: &Resource, _: &str) -> anyhow::Result<String> {
        Err(anyhow!("sink offline"))
    }
}

fn patient(id: &str) -> Resource {
    Resource::from(Patient {
        id: Some(Arc::new(Id::new(id))),
        ..Patient::default()
    })
}

fn location() -> LocationContext {
    LocationContext::new("Patient", "identifier")
}

fn error() -> Validation {
    [ValidationIssue::error("NOV_CONMAP_LOOKUP", "no mapping", location())]
        .into_iter()
        .collect()
}

fn warning() -> Validation {
    [ValidationIssue::warning("NOV_CONMAP_PARTIAL", "partial", location())]
        .into_iter()
        .collect()
}

fn tenant() -> Tenant {
    Tenant::new("abc").unwrap()
}

fn build_stage(
    registry: impl TerminologyRegistry + 'static,
    sink: Arc<dyn IssueSink>,
    options: PipelineOptions,
) -> MappingStage {
    MappingStage::new(Arc::new(registry), sink, options)
}

#[test]
fn test_no_issues_continues_with_mapped_resource() {
    let sink = Arc::new(MemoryIssueSink::new());
    let stage = build_stage(PassthroughRegistry, sink.clone(), PipelineOptions::default());
    let outcome = stage.map(&patient("1"), &tenant(), None);
    assert!(matches!(outcome, MappingOutcome::Continue(resource) if resource.id() == Some("1")));
    assert!(sink.is_empty());
}

#[test]
fn test_errors_abort_and_report_against_partial_resource() {
    let sink = Arc::new(MemoryIssueSink::new());
    let registry = FixedRegistry {
        validation: error(),
        mapped: Some(patient("partial")),
    };
    let stage = build_stage(registry, sink.clone(), PipelineOptions::default());
    let outcome = stage.map(&patient("1"), &tenant(), None);

    let MappingOutcome::Abort { report_id } = outcome else {
        panic!("expected abort");
    };
    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(report_id.as_deref(), Some(reports[0].id.as_str()));
    assert_eq!(reports[0].resource_id.as_deref(), Some("partial"));
    assert_eq!(reports[0].tenant, "abc");
}

#[test]
fn test_errors_without_mapped_resource_report_input() {
    let sink = Arc::new(MemoryIssueSink::new());
    let registry = FixedRegistry {
        validation: error(),
        mapped: None,
    };
    let stage = build_stage(registry, sink.clone(), PipelineOptions::default());
    assert!(matches!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Abort { .. }
    ));
    assert_eq!(sink.reports()[0].resource_id.as_deref(), Some("1"));
}

#[test]
fn test_warnings_are_reported_and_processing_continues() {
    let sink = Arc::new(MemoryIssueSink::new());
    let registry = FixedRegistry {
        validation: warning(),
        mapped: Some(patient("mapped")),
    };
    let stage = build_stage(registry, sink.clone(), PipelineOptions::default());
    let MappingOutcome::Continue(resource) = stage.map(&patient("1"), &tenant(), None) else {
        panic!("expected continue");
    };
    assert_eq!(resource.id(), Some("mapped"));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_warnings_not_reported_when_disabled() {
    let sink = Arc::new(MemoryIssueSink::new());
    let registry = FixedRegistry {
        validation: warning(),
        mapped: None,
    };
    let options = PipelineOptions::default().with_report_warnings(false);
    let stage = build_stage(registry, sink.clone(), options);
    assert!(matches!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Continue(_)
    ));
    assert!(sink.is_empty());
}

#[test]
fn test_strict_options_block_on_warnings() {
    let sink = Arc::new(MemoryIssueSink::new());
    let registry = FixedRegistry {
        validation: warning(),
        mapped: None,
    };
    let stage = build_stage(registry, sink.clone(), PipelineOptions::strict());
    assert!(matches!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Abort { .. }
    ));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_sink_failure_does_not_change_outcome() {
    let registry = FixedRegistry {
        validation: warning(),
        mapped: None,
    };
    let stage = build_stage(registry, Arc::new(FailingSink), PipelineOptions::default());
    assert!(matches!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Continue(_)
    ));

    let registry = FixedRegistry {
        validation: error(),
        mapped: None,
    };
    let stage = build_stage(registry, Arc::new(FailingSink), PipelineOptions::default());
    assert_eq!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Abort { report_id: None }
    );
}

#[test]
fn test_registry_failure_aborts() {
    let sink = Arc::new(MemoryIssueSink::new());
    let stage = build_stage(OfflineRegistry, sink.clone(), PipelineOptions::default());
    assert!(matches!(
        stage.map(&patient("1"), &tenant(), None),
        MappingOutcome::Abort { report_id: Some(_) }
    ));
    assert_eq!(sink.reports()[0].issues[0].code, REGISTRY_FAILURE);
}
