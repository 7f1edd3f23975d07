//! Top-level clinical resources.
//!
//! Every resource shares the same header (`id`, `meta`, `extension`,
//! `contained`); the remaining fields are the subset of each resource the
//! pipeline reads or rewrites.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::datatypes::{
    CodeableConcept, ContactPoint, Extension, HumanName, Id, Identifier, Meta, Reference,
};
use crate::dynamic::DynamicValue;
use crate::element::Element;
use crate::node::{FieldDescriptor, Node, impl_node};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<Arc<HumanName>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<Arc<ContactPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Arc<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Arc<Reference>>,
}

impl_node!(resource Patient {
    id,
    meta,
    extension,
    contained,
    identifier,
    name,
    telecom,
    general_practitioner,
    managing_organization,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practitioner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<Arc<HumanName>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<Arc<ContactPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl_node!(resource Practitioner {
    id,
    meta,
    extension,
    contained,
    identifier,
    name,
    telecom,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<Arc<CodeableConcept>>,
    pub code: Arc<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Arc<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<DynamicValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Arc<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DynamicValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretation: Vec<Arc<CodeableConcept>>,
}

impl_node!(resource Observation {
    id,
    meta,
    extension,
    contained,
    identifier,
    category,
    code,
    subject,
    effective,
    performer,
    value,
    interpretation,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<Arc<CodeableConcept>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<Arc<CodeableConcept>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<Arc<CodeableConcept>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Arc<CodeableConcept>>,
    pub subject: Arc<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<DynamicValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,
}

impl_node!(resource Condition {
    id,
    meta,
    extension,
    contained,
    identifier,
    clinical_status,
    verification_status,
    category,
    code,
    subject,
    onset,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Arc<CodeableConcept>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl_node!(resource Medication {
    id,
    meta,
    extension,
    contained,
    identifier,
    code,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    pub status: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<DynamicValue>,
    pub subject: Arc<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Arc<Reference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
}

impl_node!(resource MedicationRequest {
    id,
    meta,
    extension,
    contained,
    identifier,
    medication,
    subject,
    requester,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Arc<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Arc<Meta>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Arc<Extension>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Arc<Identifier>>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<DynamicValue>,
    pub subject: Arc<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<DynamicValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_asserted: Option<String>,
}

impl_node!(resource MedicationStatement {
    id,
    meta,
    extension,
    contained,
    identifier,
    medication,
    subject,
    effective,
});

/// Any top-level resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Arc<Patient>),
    Practitioner(Arc<Practitioner>),
    Observation(Arc<Observation>),
    Condition(Arc<Condition>),
    Medication(Arc<Medication>),
    MedicationRequest(Arc<MedicationRequest>),
    MedicationStatement(Arc<MedicationStatement>),
}

/// Runs `$body` with `$resource` bound to the typed `Arc` of a resource.
macro_rules! with_resource {
    ($value:expr, |$resource:ident| $body:expr) => {
        match $value {
            Resource::Patient($resource) => $body,
            Resource::Practitioner($resource) => $body,
            Resource::Observation($resource) => $body,
            Resource::Condition($resource) => $body,
            Resource::Medication($resource) => $body,
            Resource::MedicationRequest($resource) => $body,
            Resource::MedicationStatement($resource) => $body,
        }
    };
}

impl Resource {
    /// Every resource type in the catalog.
    pub const TYPES: &'static [&'static str] = &[
        "Patient",
        "Practitioner",
        "Observation",
        "Condition",
        "Medication",
        "MedicationRequest",
        "MedicationStatement",
    ];

    /// Child field schema of a resource type, by name.
    pub fn descriptors_for(resource_type: &str) -> Option<&'static [FieldDescriptor]> {
        match resource_type {
            "Patient" => Some(Patient::descriptors()),
            "Practitioner" => Some(Practitioner::descriptors()),
            "Observation" => Some(Observation::descriptors()),
            "Condition" => Some(Condition::descriptors()),
            "Medication" => Some(Medication::descriptors()),
            "MedicationRequest" => Some(MedicationRequest::descriptors()),
            "MedicationStatement" => Some(MedicationStatement::descriptors()),
            _ => None,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::Practitioner(_) => "Practitioner",
            Resource::Observation(_) => "Observation",
            Resource::Condition(_) => "Condition",
            Resource::Medication(_) => "Medication",
            Resource::MedicationRequest(_) => "MedicationRequest",
            Resource::MedicationStatement(_) => "MedicationStatement",
        }
    }

    pub fn id(&self) -> Option<&str> {
        with_resource!(self, |resource| resource.id.as_deref().map(Id::as_str))
    }

    pub fn meta(&self) -> Option<&Arc<Meta>> {
        with_resource!(self, |resource| resource.meta.as_ref())
    }

    /// Provenance marker carried in `meta.source`.
    pub fn source(&self) -> Option<&str> {
        self.meta().and_then(|meta| meta.source.as_deref())
    }

    pub fn profiles(&self) -> &[String] {
        self.meta()
            .map(|meta| meta.profile.as_slice())
            .unwrap_or_default()
    }

    pub fn contained(&self) -> &[Resource] {
        with_resource!(self, |resource| resource.contained.as_slice())
    }

    pub fn to_element(&self) -> Element {
        Element::Resource(self.clone())
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        self.to_element().ptr_eq(&other.to_element())
    }

    /// `ResourceType/id`, when the resource has an id.
    pub fn reference(&self) -> Option<String> {
        self.id()
            .map(|id| format!("{}/{id}", self.resource_type()))
    }
}

macro_rules! resource_from {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Resource {
                fn from(resource: $ty) -> Self {
                    Resource::$ty(Arc::new(resource))
                }
            }
        )*
    };
}

resource_from!(
    Patient,
    Practitioner,
    Observation,
    Condition,
    Medication,
    MedicationRequest,
    MedicationStatement
);
