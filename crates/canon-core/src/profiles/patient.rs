//! Patient and Practitioner profiles.

use canon_model::{
    LocationContext, Resource, Tenant, TransformError, Validation, ValidationIssue,
};

use super::common::{RECOMMENDED_FIELD, tagged};
use super::transformer::{ProfileTransformer, TransformResponse};

pub const PATIENT_PROFILE: &str = "https://fhir.canon.dev/StructureDefinition/canon-patient";
pub const PRACTITIONER_PROFILE: &str =
    "https://fhir.canon.dev/StructureDefinition/canon-practitioner";

pub struct PatientDefault;

impl ProfileTransformer for PatientDefault {
    fn resource_type(&self) -> &'static str {
        "Patient"
    }

    fn profile(&self) -> &'static str {
        PATIENT_PROFILE
    }

    fn description(&self) -> &'static str {
        "Patient demographics"
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        let mut response = tagged(resource, PATIENT_PROFILE)?;
        if let Resource::Patient(patient) = resource
            && patient.name.is_empty()
        {
            let mut validation = Validation::new();
            validation.push(ValidationIssue::warning(
                RECOMMENDED_FIELD,
                "Patient has no name",
                LocationContext::new("Patient", "name"),
            ));
            response.validation = validation;
        }
        Ok(response)
    }
}

pub struct PractitionerDefault;

impl ProfileTransformer for PractitionerDefault {
    fn resource_type(&self) -> &'static str {
        "Practitioner"
    }

    fn profile(&self) -> &'static str {
        PRACTITIONER_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        tagged(resource, PRACTITIONER_PROFILE)
    }
}
