//! Condition profiles.

use canon_model::{Resource, Tenant, TransformError};

use super::common::{CONDITION_CATEGORY, has_category, missing, tagged};
use super::transformer::{ProfileTransformer, TransformResponse};

pub const CONDITION_PROFILE: &str = "https://fhir.canon.dev/StructureDefinition/canon-condition";
pub const PROBLEM_LIST_PROFILE: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-condition-problems-health-concerns";

pub struct ConditionDefault;

impl ProfileTransformer for ConditionDefault {
    fn resource_type(&self) -> &'static str {
        "Condition"
    }

    fn profile(&self) -> &'static str {
        CONDITION_PROFILE
    }

    fn is_default(&self) -> bool {
        true
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        tagged(resource, CONDITION_PROFILE)
    }
}

/// Conditions on the problem list. A coded condition is required.
pub struct ProblemListItem;

impl ProfileTransformer for ProblemListItem {
    fn resource_type(&self) -> &'static str {
        "Condition"
    }

    fn profile(&self) -> &'static str {
        PROBLEM_LIST_PROFILE
    }

    fn description(&self) -> &'static str {
        "Conditions in the problem-list-item category"
    }

    fn qualifies(&self, resource: &Resource) -> bool {
        matches!(resource, Resource::Condition(condition)
            if has_category(&condition.category, CONDITION_CATEGORY, "problem-list-item"))
    }

    fn transform(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError> {
        if let Resource::Condition(condition) = resource
            && condition.code.is_none()
        {
            return Ok(TransformResponse::failure(missing(
                resource,
                "code",
                "code is a required element",
            )));
        }
        tagged(resource, PROBLEM_LIST_PROFILE)
    }
}
