//! Extension URLs the pipeline recognizes or writes.

use std::sync::Arc;

use canon_model::{DynamicValue, Extension, Identifier};

pub const US_CORE_RACE: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race";
pub const US_CORE_ETHNICITY: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";
pub const US_CORE_BIRTH_SEX: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-birthsex";
pub const DATA_ABSENT_REASON: &str = "http://hl7.org/fhir/StructureDefinition/data-absent-reason";

/// Marks a reference as resolvable by the tenant's data authority.
pub const DATA_AUTHORITY: &str =
    "https://fhir.canon.dev/StructureDefinition/data-authority-identifier";
pub const DATA_AUTHORITY_SYSTEM: &str = "https://fhir.canon.dev/CodeSystem/data-authority";
pub const DATA_AUTHORITY_EHR: &str = "EHR Data Authority";

/// Extensions kept by the normalizer even when they carry no value.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &[
    US_CORE_RACE,
    US_CORE_ETHNICITY,
    US_CORE_BIRTH_SEX,
    DATA_ABSENT_REASON,
    DATA_AUTHORITY,
];

pub fn data_authority_extension() -> Extension {
    Extension {
        url: Some(DATA_AUTHORITY.to_string()),
        value: Some(DynamicValue::Identifier(Arc::new(Identifier::new(
            DATA_AUTHORITY_SYSTEM,
            DATA_AUTHORITY_EHR,
        )))),
        ..Extension::default()
    }
}

pub fn is_data_authority(extension: &Extension) -> bool {
    extension.url.as_deref() == Some(DATA_AUTHORITY)
}
