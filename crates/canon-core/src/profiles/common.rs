//! Helpers shared by the profile transformers.

use std::sync::Arc;

use canon_model::{
    CodeableConcept, Element, FieldValue, LocationContext, Meta, Resource, TransformError,
    TransformedValueMap, Validation, ValidationIssue,
};
use canon_transform::rebuild_resource;

use super::transformer::{TransformOutput, TransformResponse};

/// Issue code for a required element that is missing or of the wrong type.
pub const REQUIRED_FIELD: &str = "REQ_FIELD";
/// Issue code for an element that is present but unexpected.
pub const INVALID_FIELD: &str = "INV_FIELD";
/// Issue code for data worth flagging that does not block the profile.
pub const RECOMMENDED_FIELD: &str = "REC_FIELD";

pub const OBSERVATION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/observation-category";
pub const CONDITION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/condition-category";

/// Copy of `resource` with `profile` appended to `meta.profile`.
pub fn with_profile(resource: &Resource, profile: &str) -> Result<Resource, TransformError> {
    if resource.profiles().iter().any(|existing| existing == profile) {
        return Ok(resource.clone());
    }
    let mut meta = resource.meta().map(|meta| Meta::clone(meta)).unwrap_or_default();
    meta.profile.push(profile.to_string());
    let mut changes = TransformedValueMap::new();
    changes.insert("meta", FieldValue::Single(Some(Element::Meta(Arc::new(meta)))));
    rebuild_resource(resource, changes)
}

/// Success response for a profile-tagged copy of `resource`.
pub fn tagged(resource: &Resource, profile: &str) -> Result<TransformResponse, TransformError> {
    Ok(TransformResponse::success(TransformOutput::new(with_profile(
        resource, profile,
    )?)))
}

/// True when any concept carries `system|code`.
pub fn has_category(categories: &[Arc<CodeableConcept>], system: &str, code: &str) -> bool {
    categories.iter().any(|concept| concept.has_coding(system, code))
}

pub fn missing(resource: &Resource, field: &str, description: &str) -> Validation {
    [ValidationIssue::error(
        REQUIRED_FIELD,
        description,
        LocationContext::new(resource.resource_type(), field),
    )]
    .into_iter()
    .collect()
}
