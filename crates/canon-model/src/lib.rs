//! Data model for the clinical resource transformation pipeline.
//!
//! Resources are immutable trees of `Arc`-shared nodes. The [`node`] module
//! describes their child-field schema; [`Element`] is the handle the
//! transformer walks.

pub mod datatypes;
pub mod dynamic;
pub mod element;
pub mod error;
pub mod node;
pub mod options;
pub mod resources;
pub mod tenant;
pub mod validation;

pub use datatypes::{
    CodeableConcept, Coding, ContactPoint, Extension, HumanName, Id, Identifier, Meta, Period,
    Quantity, Reference, Uri,
};
pub use dynamic::DynamicValue;
pub use element::Element;
pub use error::{ModelError, Result, TransformError};
pub use node::{FieldDescriptor, FieldKind, FieldValue, Node, TransformedValueMap};
pub use options::PipelineOptions;
pub use resources::{
    Condition, Medication, MedicationRequest, MedicationStatement, Observation, Patient,
    Practitioner, Resource,
};
pub use tenant::Tenant;
pub use validation::{
    IssueMetadata, IssueSeverity, LocationContext, Validation, ValidationIssue,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn location() -> LocationContext {
        LocationContext::new("Observation", "code")
    }

    #[test]
    fn test_validation_counts() {
        let validation: Validation = vec![
            ValidationIssue::error("NOV_CONMAP_LOOKUP", "no mapping", location()),
            ValidationIssue::warning("NOV_CONMAP_PARTIAL", "partial mapping", location()),
        ]
        .into_iter()
        .collect();
        assert_eq!(validation.error_count(), 1);
        assert_eq!(validation.warning_count(), 1);
        assert!(validation.has_errors());
        assert!(validation.has_issues());
    }

    #[test]
    fn test_empty_validation_has_no_issues() {
        let validation = Validation::new();
        assert!(!validation.has_issues());
        assert!(!validation.has_errors());
    }

    #[test]
    fn test_tenant_rejects_blank() {
        assert!(Tenant::new("  ").is_err());
        let tenant = Tenant::new(" abc ").expect("valid tenant");
        assert_eq!(tenant.mnemonic(), "abc");
        assert_eq!(tenant.prefix(), "abc-");
    }

    #[test]
    fn test_tenant_rejects_characters_outside_id_charset() {
        for mnemonic in ["a/b", "a b", "a_b", "abc#", "ä"] {
            assert!(matches!(
                Tenant::new(mnemonic),
                Err(ModelError::InvalidTenant(value)) if value == mnemonic
            ));
        }
        assert!(Tenant::new("site-1.eu").is_ok());
    }

    #[test]
    fn test_strict_options_block_on_warnings() {
        let options = PipelineOptions::strict();
        assert!(options.warnings_are_blocking);
        assert!(!PipelineOptions::default().warnings_are_blocking);
    }

    #[test]
    fn test_rewrap_rejects_other_variant() {
        let value = DynamicValue::Quantity(Arc::new(Quantity::default()));
        let payload = Element::Coding(Arc::new(Coding::default()));
        assert_eq!(
            value.rewrap(payload),
            Err(TransformError::VariantMismatch {
                tag: "Quantity",
                found: "Coding",
            })
        );
    }

    #[test]
    fn test_primitive_union_has_no_payload() {
        assert!(DynamicValue::String("x".into()).payload().is_none());
        assert!(DynamicValue::Boolean(true).payload().is_none());
    }
}
