//! Tests for tenant localization.

use std::sync::Arc;

use canon_model::{
    Coding, CodeableConcept, Condition, Element, Id, Meta, Observation, Reference, Resource,
    Tenant, Uri,
};
use canon_transform::extensions::{DATA_AUTHORITY, is_data_authority};
use canon_transform::{Localizer, Rewrite, Rule, localize_id, run};
use proptest::prelude::*;

fn tenant() -> Tenant {
    Tenant::new("abc").unwrap()
}

fn localize(resource: &Resource) -> Resource {
    run(&resource.to_element(), &tenant(), &Localizer)
        .unwrap()
        .into_resource()
        .unwrap()
}

fn condition() -> Resource {
    Resource::from(Condition {
        id: Some(Arc::new(Id::new("123"))),
        meta: Some(Arc::new(Meta {
            version_id: Some(Arc::new(Id::new("7"))),
            ..Meta::default()
        })),
        subject: Arc::new(Reference::new("Patient/456")),
        contained: vec![Resource::from(Observation {
            id: Some(Arc::new(Id::new("inline"))),
            status: "final".to_string(),
            code: Arc::new(CodeableConcept::from_codings([Coding::new("http://loinc.org", "1")])),
            ..Observation::default()
        })],
        ..Condition::default()
    })
}

#[test]
fn test_localize_id_adds_prefix() {
    assert_eq!(localize_id("123", &tenant()), "abc-123");
    assert_eq!(localize_id("abc-123", &tenant()), "abc-123");
}

#[test]
fn test_localize_id_prefix_ambiguity_is_preserved() {
    // An unrelated id that already starts with "<tenant>-" is not prefixed.
    assert_eq!(localize_id("abc-unrelated", &tenant()), "abc-unrelated");
    // Without the hyphen the value is prefixed.
    assert_eq!(localize_id("abcdef", &tenant()), "abc-abcdef");
}

#[test]
fn test_localize_resource() {
    let Resource::Condition(localized) = localize(&condition()) else {
        panic!("expected Condition");
    };
    assert_eq!(localized.id.as_deref().map(Id::as_str), Some("abc-123"));
    assert_eq!(localized.subject.reference.as_deref(), Some("Patient/abc-456"));
    let type_ = localized.subject.type_.as_ref().unwrap();
    assert_eq!(type_.value.as_deref(), Some("Patient"));
    assert_eq!(type_.extension.len(), 1);
    assert_eq!(type_.extension[0].url.as_deref(), Some(DATA_AUTHORITY));
}

#[test]
fn test_contained_and_version_id_are_opaque() {
    let original = condition();
    let Resource::Condition(localized) = localize(&original) else {
        panic!("expected Condition");
    };
    let Resource::Condition(original) = original else {
        unreachable!();
    };
    assert_eq!(localized.contained[0].id(), Some("inline"));
    assert_eq!(
        localized.meta.as_ref().and_then(|meta| meta.version_id.as_deref()).map(Id::as_str),
        Some("7")
    );
    assert!(Arc::ptr_eq(
        localized.meta.as_ref().unwrap(),
        original.meta.as_ref().unwrap()
    ));
}

#[test]
fn test_external_reference_is_unchanged() {
    let reference = Reference::new("http://example.org/fhir/Patient/456");
    assert_eq!(
        Localizer.rewrite(&Element::Reference(Arc::new(reference)), &tenant()),
        Rewrite::Unchanged
    );
}

#[test]
fn test_existing_type_keeps_value_and_gains_marker() {
    let reference = Reference {
        type_: Some(Arc::new(Uri::new("Practitioner"))),
        ..Reference::new("Practitioner/9/_history/3")
    };
    let Rewrite::Replace(Element::Reference(localized)) =
        Localizer.rewrite(&Element::Reference(Arc::new(reference)), &tenant())
    else {
        panic!("expected replaced reference");
    };
    insta::assert_snapshot!(localized.reference.as_deref().unwrap(), @"Practitioner/abc-9/_history/3");
    let type_ = localized.type_.as_ref().unwrap();
    assert_eq!(type_.value.as_deref(), Some("Practitioner"));
    assert_eq!(type_.extension.iter().filter(|ext| is_data_authority(ext)).count(), 1);
}

#[test]
fn test_localizing_twice_is_identity() {
    let once = run(&condition().to_element(), &tenant(), &Localizer).unwrap();
    let twice = run(&once, &tenant(), &Localizer).unwrap();
    assert!(twice.ptr_eq(&once));
}

proptest! {
    #[test]
    fn test_localize_id_is_idempotent(value in "[A-Za-z0-9.]{1,40}") {
        let tenant = Tenant::new("tenant").unwrap();
        let once = localize_id(&value, &tenant);
        prop_assert_eq!(localize_id(&once, &tenant), once.clone());
        prop_assert!(once.starts_with("tenant-"));
    }

    #[test]
    fn test_localized_reference_is_stable(id in "[A-Za-z0-9.]{1,40}") {
        let reference = Element::Reference(Arc::new(Reference::new(format!("Patient/{id}"))));
        let Rewrite::Replace(localized) = Localizer.rewrite(&reference, &tenant()) else {
            panic!("local reference was not rewritten");
        };
        prop_assert_eq!(Localizer.rewrite(&localized, &tenant()), Rewrite::Unchanged);
    }
}
