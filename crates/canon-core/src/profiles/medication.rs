//! Medication profiles. Request and statement transformers promote inline
//! and contained medications to standalone resources.

use canon_model::{DynamicValue, Resource, Tenant, TransformError};
use canon_transform::extract_medication;

use super::common::{tagged, with_profile};
use super::transformer::{ProfileTransformer, TransformOutput, TransformResponse};

pub const MEDICATION_PROFILE: &str = "https://fhir.canon.dev/StructureDefinition/canon-medication";
pub const MEDICATION_REQUEST_PROFILE: &str =
    "https://fhir.canon.dev/StructureDefinition/canon-medication-request";
pub const MEDICATION_STATEMENT_PROFILE: &str =
    "https://fhir.canon.dev/StructureDefinition/canon-medication-statement";

pub struct MedicationDefault;

impl ProfileTransformer for MedicationDefault {
    fn resource_type(&self) -> &'static str {
        "Medication"
    }

    fn profile(&self) -> &'static str {
        MEDICATION_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        tagged(resource, MEDICATION_PROFILE)
    }
}

fn medication_field(resource: &Resource) -> Option<&DynamicValue> {
    match resource {
        Resource::MedicationRequest(request) => request.medication.as_ref(),
        Resource::MedicationStatement(statement) => statement.medication.as_ref(),
        _ => None,
    }
}

/// Extracts `medication[x]` and tags the parent with `profile`.
fn extract_and_tag(
    resource: &Resource,
    profile: &'static str,
) -> Result<TransformResponse, TransformError> {
    let extraction =
        extract_medication(medication_field(resource), resource.contained(), resource)?;
    let output = match extraction {
        Some(extraction) => {
            let parent = extraction.apply(resource, "medication")?;
            let extracted = with_profile(&extraction.extracted, MEDICATION_PROFILE)?;
            tracing::debug!(
                extracted_type = extracted.resource_type(),
                extracted_id = extracted.id().unwrap_or_default(),
                "medication extracted"
            );
            TransformOutput {
                resource: with_profile(&parent, profile)?,
                embedded: vec![extracted],
            }
        }
        None => TransformOutput::new(with_profile(resource, profile)?),
    };
    Ok(TransformResponse::success(output))
}

pub struct MedicationRequestDefault;

impl ProfileTransformer for MedicationRequestDefault {
    fn resource_type(&self) -> &'static str {
        "MedicationRequest"
    }

    fn profile(&self) -> &'static str {
        MEDICATION_REQUEST_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        extract_and_tag(resource, MEDICATION_REQUEST_PROFILE)
    }
}

pub struct MedicationStatementDefault;

impl ProfileTransformer for MedicationStatementDefault {
    fn resource_type(&self) -> &'static str {
        "MedicationStatement"
    }

    fn profile(&self) -> &'static str {
        MEDICATION_STATEMENT_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        extract_and_tag(resource, MEDICATION_STATEMENT_PROFILE)
    }
}
