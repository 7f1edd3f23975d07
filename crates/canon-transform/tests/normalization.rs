//! Tests for the normalization rules.

use std::sync::Arc;

use canon_model::{
    CodeableConcept, Coding, ContactPoint, DynamicValue, Element, Extension, Id, Identifier,
    Patient, Resource, Tenant,
};
use canon_transform::extensions::US_CORE_RACE;
use canon_transform::{Normalizer, Rewrite, Rule, run};

fn tenant() -> Tenant {
    Tenant::new("test").unwrap()
}

fn rewrite(element: Element) -> Rewrite {
    Normalizer.rewrite(&element, &tenant())
}

fn replaced_concept(rewrite: Rewrite) -> Arc<CodeableConcept> {
    match rewrite {
        Rewrite::Replace(Element::CodeableConcept(concept)) => concept,
        other => panic!("expected replaced concept, got {other:?}"),
    }
}

#[test]
fn test_concept_text_from_selected_coding() {
    let concept = CodeableConcept::from_codings([
        Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "161")
            .selected(false)
            .with_display("Acetaminophen"),
        Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "2748023")
            .selected(true)
            .with_display("acetaminophen"),
    ]);
    let concept = replaced_concept(rewrite(Element::CodeableConcept(Arc::new(concept))));
    assert_eq!(concept.text.as_deref(), Some("acetaminophen"));
    assert_eq!(concept.coding.len(), 2);
}

#[test]
fn test_concept_text_from_single_coding() {
    let concept = CodeableConcept::from_codings([
        Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
    ]);
    let concept = replaced_concept(rewrite(Element::CodeableConcept(Arc::new(concept))));
    assert_eq!(concept.text.as_deref(), Some("Body weight"));
}

#[test]
fn test_concept_text_is_kept() {
    let concept = CodeableConcept {
        text: Some("Weight".to_string()),
        ..CodeableConcept::from_codings([
            Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
        ])
    };
    assert_eq!(
        rewrite(Element::CodeableConcept(Arc::new(concept))),
        Rewrite::Unchanged
    );
}

#[test]
fn test_whitespace_concept_text_is_kept() {
    let concept = CodeableConcept {
        text: Some(" ".to_string()),
        ..CodeableConcept::from_codings([
            Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
        ])
    };
    assert_eq!(
        rewrite(Element::CodeableConcept(Arc::new(concept))),
        Rewrite::Unchanged
    );

    let empty = CodeableConcept {
        text: Some(String::new()),
        ..CodeableConcept::from_codings([
            Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
        ])
    };
    let filled = replaced_concept(rewrite(Element::CodeableConcept(Arc::new(empty))));
    assert_eq!(filled.text.as_deref(), Some("Body weight"));
}

#[test]
fn test_concept_text_ambiguous_codings() {
    let unselected = CodeableConcept::from_codings([
        Coding::new("http://loinc.org", "1").with_display("One"),
        Coding::new("http://loinc.org", "2").with_display("Two"),
    ]);
    assert_eq!(
        rewrite(Element::CodeableConcept(Arc::new(unselected))),
        Rewrite::Unchanged
    );

    let both_selected = CodeableConcept::from_codings([
        Coding::new("http://loinc.org", "1").selected(true).with_display("One"),
        Coding::new("http://loinc.org", "2").selected(true).with_display("Two"),
    ]);
    assert_eq!(
        rewrite(Element::CodeableConcept(Arc::new(both_selected))),
        Rewrite::Unchanged
    );

    let no_display = CodeableConcept::from_codings([Coding::new("http://loinc.org", "1")]);
    assert_eq!(
        rewrite(Element::CodeableConcept(Arc::new(no_display))),
        Rewrite::Unchanged
    );
}

#[test]
fn test_contact_point_without_value_or_system_is_removed() {
    let empty = ContactPoint::default();
    assert_eq!(rewrite(Element::ContactPoint(Arc::new(empty))), Rewrite::Remove);
}

#[test]
fn test_contact_point_with_system_only_is_kept() {
    let phone = ContactPoint {
        value: None,
        system: Some("phone".to_string()),
        ..ContactPoint::default()
    };
    assert_eq!(rewrite(Element::ContactPoint(Arc::new(phone))), Rewrite::Unchanged);
}

#[test]
fn test_legacy_coding_system_is_replaced() {
    let coding = Coding::new("urn:oid:2.16.840.1.113883.6.88", "161");
    let Rewrite::Replace(Element::Coding(coding)) = rewrite(Element::Coding(Arc::new(coding)))
    else {
        panic!("expected replaced coding");
    };
    assert_eq!(
        coding.system.as_deref(),
        Some("http://www.nlm.nih.gov/research/umls/rxnorm")
    );
    assert_eq!(coding.code.as_deref(), Some("161"));
}

#[test]
fn test_legacy_identifier_system_is_replaced() {
    let identifier = Identifier::new("2.16.840.1.113883.4.6", "1234567890");
    let Rewrite::Replace(Element::Identifier(identifier)) =
        rewrite(Element::Identifier(Arc::new(identifier)))
    else {
        panic!("expected replaced identifier");
    };
    assert_eq!(identifier.system.as_deref(), Some("http://hl7.org/fhir/sid/us-npi"));
}

#[test]
fn test_extension_rules() {
    let empty_recognized = Extension {
        url: Some(US_CORE_RACE.to_string()),
        ..Extension::default()
    };
    let valued = Extension {
        url: Some("http://example.org/custom".to_string()),
        value: Some(DynamicValue::String("x".to_string())),
        ..Extension::default()
    };
    let empty_custom = Extension {
        url: Some("http://example.org/custom".to_string()),
        ..Extension::default()
    };
    let no_url = Extension {
        value: Some(DynamicValue::Boolean(true)),
        ..Extension::default()
    };
    assert_eq!(rewrite(Element::Extension(Arc::new(empty_recognized))), Rewrite::Unchanged);
    assert_eq!(rewrite(Element::Extension(Arc::new(valued))), Rewrite::Unchanged);
    assert_eq!(rewrite(Element::Extension(Arc::new(empty_custom))), Rewrite::Remove);
    assert_eq!(rewrite(Element::Extension(Arc::new(no_url))), Rewrite::Remove);
}

#[test]
fn test_normalize_patient() {
    let patient = Resource::from(Patient {
        id: Some(Arc::new(Id::new("p1"))),
        identifier: vec![Arc::new(Identifier::new("urn:oid:2.16.840.1.113883.4.1", "123-45-6789"))],
        telecom: vec![
            Arc::new(ContactPoint::default()),
            Arc::new(ContactPoint {
                system: Some("email".to_string()),
                value: Some("a@example.org".to_string()),
                ..ContactPoint::default()
            }),
        ],
        extension: vec![Arc::new(Extension {
            url: Some("http://example.org/empty".to_string()),
            ..Extension::default()
        })],
        ..Patient::default()
    });

    let normalized = run(&patient.to_element(), &tenant(), &Normalizer).unwrap();
    let Some(Resource::Patient(normalized)) = normalized.into_resource() else {
        panic!("expected Patient");
    };
    assert_eq!(normalized.telecom.len(), 1);
    assert!(normalized.extension.is_empty());
    insta::assert_json_snapshot!(normalized.identifier, @r#"
    [
      {
        "system": "http://hl7.org/fhir/sid/us-ssn",
        "value": "123-45-6789"
      }
    ]
    "#);
}

#[test]
fn test_normalized_resource_is_stable() {
    let patient = Resource::from(Patient {
        id: Some(Arc::new(Id::new("p1"))),
        telecom: vec![Arc::new(ContactPoint::default())],
        identifier: vec![Arc::new(Identifier::new("2.16.840.1.113883.4.1", "1"))],
        ..Patient::default()
    });
    let once = run(&patient.to_element(), &tenant(), &Normalizer).unwrap();
    let twice = run(&once, &tenant(), &Normalizer).unwrap();
    assert!(twice.ptr_eq(&once));
}
