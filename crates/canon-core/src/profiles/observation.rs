//! Observation profiles: default, vital signs, laboratory and body weight.

use std::sync::Arc;

use canon_map::TerminologyRegistry;
use canon_model::{
    DynamicValue, LocationContext, Observation, Resource, Tenant, TransformError,
    ValidationIssue,
};

use super::common::{INVALID_FIELD, OBSERVATION_CATEGORY, has_category, missing, tagged};
use super::transformer::{ProfileTransformer, TransformResponse};

pub const OBSERVATION_PROFILE: &str =
    "https://fhir.canon.dev/StructureDefinition/canon-observation";
pub const VITAL_SIGNS_PROFILE: &str = "http://hl7.org/fhir/StructureDefinition/vitalsigns";
pub const LABORATORY_PROFILE: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-observation-lab";
pub const BODY_WEIGHT_PROFILE: &str = "http://hl7.org/fhir/StructureDefinition/bodyweight";

fn observation(resource: &Resource) -> Option<&Arc<Observation>> {
    match resource {
        Resource::Observation(observation) => Some(observation),
        _ => None,
    }
}

fn in_category(resource: &Resource, code: &str) -> bool {
    observation(resource)
        .is_some_and(|observation| has_category(&observation.category, OBSERVATION_CATEGORY, code))
}

/// Profiles that need a subject share this check.
fn require_subject(
    resource: &Resource,
    profile: &'static str,
) -> Result<TransformResponse, TransformError> {
    if observation(resource).is_some_and(|observation| observation.subject.is_none()) {
        return Ok(TransformResponse::failure(missing(
            resource,
            "subject",
            "subject is a required element",
        )));
    }
    tagged(resource, profile)
}

pub struct ObservationDefault;

impl ProfileTransformer for ObservationDefault {
    fn resource_type(&self) -> &'static str {
        "Observation"
    }

    fn profile(&self) -> &'static str {
        OBSERVATION_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        tagged(resource, OBSERVATION_PROFILE)
    }
}

pub struct VitalSigns;

impl ProfileTransformer for VitalSigns {
    fn resource_type(&self) -> &'static str {
        "Observation"
    }

    fn profile(&self) -> &'static str {
        VITAL_SIGNS_PROFILE
    }

    fn description(&self) -> &'static str {
        "Observations in the vital-signs category"
    }

    fn qualifies(&self, resource: &Resource) -> bool {
        in_category(resource, "vital-signs")
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        require_subject(resource, VITAL_SIGNS_PROFILE)
    }
}

pub struct Laboratory;

impl ProfileTransformer for Laboratory {
    fn resource_type(&self) -> &'static str {
        "Observation"
    }

    fn profile(&self) -> &'static str {
        LABORATORY_PROFILE
    }

    fn description(&self) -> &'static str {
        "Observations in the laboratory category"
    }

    fn qualifies(&self, resource: &Resource) -> bool {
        in_category(resource, "laboratory")
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        require_subject(resource, LABORATORY_PROFILE)
    }
}

/// Body weight observations, identified by a code in the profile's
/// required value set.
pub struct BodyWeight {
    terminology: Arc<dyn TerminologyRegistry>,
}

impl BodyWeight {
    pub fn new(terminology: Arc<dyn TerminologyRegistry>) -> Self {
        Self { terminology }
    }
}

impl ProfileTransformer for BodyWeight {
    fn resource_type(&self) -> &'static str {
        "Observation"
    }

    fn profile(&self) -> &'static str {
        BODY_WEIGHT_PROFILE
    }

    fn description(&self) -> &'static str {
        "Observations coded as body weight"
    }

    fn qualifies(&self, resource: &Resource) -> bool {
        let Some(observation) = observation(resource) else {
            return false;
        };
        self.terminology
            .required_value_set("Observation.code", BODY_WEIGHT_PROFILE)
            .iter()
            .any(|required| {
                observation.code.coding.iter().any(|coding| {
                    coding.system == required.system && coding.code == required.code
                })
            })
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        let value = observation(resource).and_then(|observation| observation.value.as_ref());
        if let Some(value) = value
            && !matches!(value, DynamicValue::Quantity(_))
        {
            let validation = [ValidationIssue::error(
                INVALID_FIELD,
                format!("body weight value must be a Quantity, found {}", value.type_name()),
                LocationContext::new("Observation", "value"),
            )]
            .into_iter()
            .collect();
            return Ok(TransformResponse::failure(validation));
        }
        tagged(resource, BODY_WEIGHT_PROFILE)
    }
}
