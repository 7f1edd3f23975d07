use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};

use canon_map::{
    CONCEPT_MAP_LOOKUP, ConceptMapDocument, ConceptMapRegistry, MappingError, TerminologyRegistry,
};
use canon_model::{CodeableConcept, Coding, Id, Observation, Reference, Resource, Tenant};

const TENANT_SYSTEM: &str = "urn:tenant:abc:observation";
const BODY_WEIGHT: &str = "http://hl7.org/fhir/StructureDefinition/bodyweight";

fn document_json() -> String {
    serde_json::json!({
        "conceptMaps": [{
            "id": "observation-code",
            "name": "Tenant Observation codes",
            "tenant": "abc",
            "resourceType": "Observation",
            "field": "code",
            "entries": [{
                "source": { "system": TENANT_SYSTEM, "code": "WT" },
                "target": [{ "system": "http://loinc.org", "code": "29463-7", "display": "Body weight" }]
            }]
        }],
        "valueSets": [{
            "fieldPath": "Observation.code",
            "profile": BODY_WEIGHT,
            "codes": [{ "system": "http://loinc.org", "code": "29463-7" }]
        }]
    })
    .to_string()
}

fn registry() -> ConceptMapRegistry {
    ConceptMapRegistry::from_json(&document_json()).unwrap()
}

fn observation(code: &str) -> Resource {
    Resource::from(Observation {
        id: Some(Arc::new(Id::new("obs-1"))),
        status: "final".to_string(),
        code: Arc::new(CodeableConcept::from_codings([Coding::new(TENANT_SYSTEM, code)])),
        subject: Some(Arc::new(Reference::new("Patient/1"))),
        ..Observation::default()
    })
}

fn tenant(mnemonic: &str) -> Tenant {
    Tenant::new(mnemonic).unwrap()
}

fn codes(resource: &Resource) -> Vec<String> {
    let Resource::Observation(observation) = resource else {
        panic!("expected Observation");
    };
    observation
        .code
        .coding
        .iter()
        .filter_map(|coding| coding.code.clone())
        .collect()
}

fn temp_file(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    path.push(format!("canon_map_{name}_{stamp}.json"));
    path
}

#[test]
fn test_mapped_code_is_appended() {
    let result = registry()
        .map_resource(&observation("WT"), &tenant("abc"), None)
        .unwrap();
    assert!(!result.validation.has_issues());
    let mapped = result.resource.unwrap();
    assert_eq!(codes(&mapped), vec!["WT", "29463-7"]);
}

#[test]
fn test_mapping_is_idempotent() {
    let registry = registry();
    let once = registry
        .map_resource(&observation("WT"), &tenant("abc"), None)
        .unwrap()
        .resource
        .unwrap();
    let twice = registry
        .map_resource(&once, &tenant("abc"), None)
        .unwrap()
        .resource
        .unwrap();
    assert!(twice.ptr_eq(&once));
}

#[test]
fn test_unmapped_code_raises_error() {
    let result = registry()
        .map_resource(&observation("HT"), &tenant("abc"), None)
        .unwrap();
    assert!(result.validation.has_errors());
    let issue = &result.validation.issues()[0];
    assert_eq!(issue.code, CONCEPT_MAP_LOOKUP);
    assert_eq!(issue.location.element, "Observation");
    assert_eq!(issue.location.field, "code");
    insta::assert_snapshot!(issue.description, @"Tenant source value 'HT' has no target defined in Tenant Observation codes");
    let metadata = issue.metadata.as_ref().unwrap();
    assert_eq!(metadata[0].registry_entry_id, "observation-code");
}

#[test]
fn test_map_for_other_tenant_is_ignored() {
    let source = observation("HT");
    let result = registry()
        .map_resource(&source, &tenant("xyz"), None)
        .unwrap();
    assert!(!result.validation.has_issues());
    assert!(result.resource.unwrap().ptr_eq(&source));
}

#[test]
fn test_required_value_set() {
    let registry = registry();
    let codes = registry.required_value_set("Observation.code", BODY_WEIGHT);
    assert_eq!(codes.len(), 1);
    assert!(codes[0].matches("http://loinc.org", "29463-7"));
    assert!(registry.required_value_set("Observation.code", "other").is_empty());
}

#[test]
fn test_unknown_field_is_rejected() {
    let document: ConceptMapDocument = serde_json::from_value(serde_json::json!({
        "conceptMaps": [{
            "id": "bad",
            "resourceType": "Observation",
            "field": "status",
            "entries": []
        }]
    }))
    .unwrap();
    assert_eq!(
        ConceptMapRegistry::new(document).unwrap_err(),
        MappingError::UnknownField {
            map: "bad".to_string(),
            resource_type: "Observation".to_string(),
            field: "status".to_string(),
        }
    );
}

#[test]
fn test_non_concept_field_is_rejected() {
    let document: ConceptMapDocument = serde_json::from_value(serde_json::json!({
        "conceptMaps": [{
            "id": "subject",
            "resourceType": "Observation",
            "field": "subject",
            "entries": [{
                "source": { "system": "s", "code": "c" },
                "target": [{ "system": "t", "code": "d" }]
            }]
        }]
    }))
    .unwrap();
    let error = ConceptMapRegistry::new(document).unwrap_err();
    assert!(matches!(error, MappingError::NotConceptField { .. }));
    insta::assert_snapshot!(error.to_string(), @"Concept map 'subject' targets 'Observation.subject', which cannot hold a CodeableConcept");
}

#[test]
fn test_choice_field_is_accepted() {
    let document: ConceptMapDocument = serde_json::from_value(serde_json::json!({
        "conceptMaps": [{
            "id": "value",
            "resourceType": "Observation",
            "field": "value",
            "entries": [{
                "source": { "system": "s", "code": "c" },
                "target": [{ "system": "t", "code": "d" }]
            }]
        }]
    }))
    .unwrap();
    assert!(ConceptMapRegistry::new(document).is_ok());
}

#[test]
fn test_empty_target_is_rejected() {
    let document: ConceptMapDocument = serde_json::from_value(serde_json::json!({
        "conceptMaps": [{
            "id": "empty",
            "resourceType": "Condition",
            "field": "code",
            "entries": [{ "source": { "system": "s", "code": "c" }, "target": [] }]
        }]
    }))
    .unwrap();
    let error = ConceptMapRegistry::new(document).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Concept map 'empty' has no target for source code 'c'"
    );
}

#[test]
fn test_force_reload_reads_file_again() {
    let path = temp_file("reload");
    fs::write(&path, r#"{ "conceptMaps": [] }"#).unwrap();
    let registry = ConceptMapRegistry::load(&path).unwrap();
    assert_eq!(registry.map_count(), 0);

    fs::write(&path, document_json()).unwrap();
    // A reload instant older than the cache keeps the cached maps.
    let stale = registry.loaded_at().unwrap() - Duration::seconds(60);
    registry
        .map_resource(&observation("WT"), &tenant("abc"), Some(stale))
        .unwrap();
    assert_eq!(registry.map_count(), 0);

    let fresh = Utc::now() + Duration::seconds(60);
    let result = registry
        .map_resource(&observation("WT"), &tenant("abc"), Some(fresh))
        .unwrap();
    assert_eq!(registry.map_count(), 1);
    assert_eq!(codes(&result.resource.unwrap()), vec!["WT", "29463-7"]);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_future_force_reload_reads_file_once() {
    let path = temp_file("future");
    fs::write(&path, r#"{ "conceptMaps": [] }"#).unwrap();
    let registry = ConceptMapRegistry::load(&path).unwrap();
    fs::write(&path, document_json()).unwrap();

    let as_of = Utc::now() + Duration::hours(1);
    registry
        .map_resource(&observation("WT"), &tenant("abc"), Some(as_of))
        .unwrap();
    let reloaded_at = registry.loaded_at().unwrap();
    assert!(reloaded_at >= as_of);
    assert_eq!(registry.map_count(), 1);

    fs::write(&path, r#"{ "conceptMaps": [] }"#).unwrap();
    for _ in 0..4 {
        registry
            .map_resource(&observation("WT"), &tenant("abc"), Some(as_of))
            .unwrap();
    }
    assert_eq!(registry.loaded_at().unwrap(), reloaded_at);
    assert_eq!(registry.map_count(), 1);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_missing_file_is_reported_with_path() {
    let path = temp_file("missing");
    let error = ConceptMapRegistry::load(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to read concept maps"));
}
