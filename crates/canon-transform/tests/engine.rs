//! Tests for the structural transformer.

use std::sync::{Arc, Mutex};

use canon_model::{
    CodeableConcept, Coding, ContactPoint, DynamicValue, Element, FieldValue, Id, Observation,
    Patient, Quantity, Reference, Resource, Tenant, TransformError,
};
use canon_transform::{Rewrite, Rule, run, transform_children};

fn tenant() -> Tenant {
    Tenant::new("test").unwrap()
}

fn observation() -> Resource {
    observation_coded("29463-7")
}

fn observation_coded(code: &str) -> Resource {
    Resource::from(Observation {
        id: Some(Arc::new(Id::new("obs-1"))),
        status: "final".to_string(),
        code: Arc::new(CodeableConcept::from_codings([Coding::new(
            "http://loinc.org",
            code,
        )])),
        subject: Some(Arc::new(Reference::new("Patient/1"))),
        value: Some(DynamicValue::Quantity(Arc::new(Quantity {
            value: Some(70.0),
            unit: Some("kg".to_string()),
            ..Quantity::default()
        }))),
        ..Observation::default()
    })
}

/// Removes every node of one type.
struct RemoveAll(&'static str);

impl Rule for RemoveAll {
    fn name(&self) -> &'static str {
        "remove-all"
    }

    fn rewrite(&self, element: &Element, _tenant: &Tenant) -> Rewrite {
        if element.type_name() == self.0 {
            Rewrite::Remove
        } else {
            Rewrite::Unchanged
        }
    }
}

/// Upper-cases coding codes.
struct UpperCodes;

impl Rule for UpperCodes {
    fn name(&self) -> &'static str {
        "upper-codes"
    }

    fn rewrite(&self, element: &Element, _tenant: &Tenant) -> Rewrite {
        let Element::Coding(coding) = element else {
            return Rewrite::Unchanged;
        };
        let Some(code) = coding.code.as_deref() else {
            return Rewrite::Unchanged;
        };
        if code == code.to_uppercase() {
            return Rewrite::Unchanged;
        }
        let mut next = Coding::clone(coding);
        next.code = Some(code.to_uppercase());
        Rewrite::Replace(Element::Coding(Arc::new(next)))
    }
}

/// Records the order in which nodes are offered.
#[derive(Default)]
struct Recorder(Mutex<Vec<&'static str>>);

impl Rule for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn rewrite(&self, element: &Element, _tenant: &Tenant) -> Rewrite {
        self.0.lock().unwrap().push(element.type_name());
        Rewrite::Unchanged
    }
}

/// Doubles quantity values.
struct DoubleQuantity;

impl Rule for DoubleQuantity {
    fn name(&self) -> &'static str {
        "double-quantity"
    }

    fn rewrite(&self, element: &Element, _tenant: &Tenant) -> Rewrite {
        match element {
            Element::Quantity(quantity) => Rewrite::Replace(Element::Quantity(Arc::new(Quantity {
                value: quantity.value.map(|value| value * 2.0),
                ..Quantity::clone(quantity)
            }))),
            _ => Rewrite::Unchanged,
        }
    }
}

#[test]
fn test_removing_every_list_element_yields_empty_list() {
    let patient = Resource::from(Patient {
        id: Some(Arc::new(Id::new("p1"))),
        telecom: vec![
            Arc::new(ContactPoint::default()),
            Arc::new(ContactPoint::default()),
        ],
        ..Patient::default()
    });
    let changes =
        transform_children(&patient.to_element(), &tenant(), &RemoveAll("ContactPoint")).unwrap();
    assert_eq!(changes.get("telecom"), Some(&FieldValue::List(Vec::new())));

    let Resource::Patient(result) = run(&patient.to_element(), &tenant(), &RemoveAll("ContactPoint"))
        .unwrap()
        .into_resource()
        .unwrap()
    else {
        panic!("expected Patient");
    };
    assert!(result.telecom.is_empty());
}

#[test]
fn test_untouched_list_is_omitted_from_changes() {
    let changes = transform_children(&observation().to_element(), &tenant(), &UpperCodes).unwrap();
    assert!(!changes.contains_key("category"));
    assert!(changes.is_empty());
}

#[test]
fn test_nested_change_rebuilds_ancestors_only() {
    let resource = observation_coded("abc");
    let Resource::Observation(original) = &resource else {
        unreachable!();
    };

    let result = run(&resource.to_element(), &tenant(), &UpperCodes).unwrap();
    let Some(Resource::Observation(updated)) = result.into_resource() else {
        panic!("expected Observation");
    };
    assert_eq!(updated.code.coding[0].code.as_deref(), Some("ABC"));
    assert!(!Arc::ptr_eq(&updated.code, &original.code));
    let (Some(before), Some(after)) = (&original.subject, &updated.subject) else {
        panic!("subject missing");
    };
    assert!(Arc::ptr_eq(before, after));
}

#[test]
fn test_children_are_visited_before_parent() {
    let recorder = Recorder::default();
    run(&observation().to_element(), &tenant(), &recorder).unwrap();
    let visited = recorder.0.into_inner().unwrap();
    let coding = visited.iter().position(|name| *name == "Coding").unwrap();
    let concept = visited.iter().position(|name| *name == "CodeableConcept").unwrap();
    assert!(coding < concept);
    assert!(!visited.contains(&"Observation"));
}

#[test]
fn test_union_payload_is_rewrapped() {
    let result = run(&observation().to_element(), &tenant(), &DoubleQuantity).unwrap();
    let Some(Resource::Observation(updated)) = result.into_resource() else {
        panic!("expected Observation");
    };
    let Some(DynamicValue::Quantity(quantity)) = &updated.value else {
        panic!("expected Quantity value");
    };
    assert_eq!(quantity.value, Some(140.0));
}

#[test]
fn test_removing_union_payload_clears_optional_field() {
    let result = run(&observation().to_element(), &tenant(), &RemoveAll("Quantity")).unwrap();
    let Some(Resource::Observation(updated)) = result.into_resource() else {
        panic!("expected Observation");
    };
    assert!(updated.value.is_none());
}

#[test]
fn test_removing_required_field_is_a_contract_violation() {
    let error = run(
        &observation().to_element(),
        &tenant(),
        &RemoveAll("CodeableConcept"),
    )
    .unwrap_err();
    assert_eq!(
        error,
        TransformError::RequiredFieldRemoved {
            node: "Observation",
            field: "code",
        }
    );
}

#[test]
fn test_second_run_is_identity() {
    let once = run(&observation_coded("abc").to_element(), &tenant(), &UpperCodes).unwrap();
    assert!(!once.ptr_eq(&observation_coded("abc").to_element()));
    let twice = run(&once, &tenant(), &UpperCodes).unwrap();
    assert!(twice.ptr_eq(&once));
}
