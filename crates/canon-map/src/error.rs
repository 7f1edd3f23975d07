//! Error types for concept-map loading.

use std::fmt;

/// Problems found in a concept-map document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The map targets a resource type outside the catalog.
    UnknownResourceType { map: String, resource_type: String },
    /// The mapped field is not a child field of the resource type.
    UnknownField {
        map: String,
        resource_type: String,
        field: String,
    },
    /// The mapped field cannot hold a CodeableConcept.
    NotConceptField {
        map: String,
        resource_type: String,
        field: String,
    },
    /// A source code maps to nothing.
    EmptyTarget { map: String, code: String },
    /// The same map id is declared twice.
    DuplicateMap(String),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownResourceType { map, resource_type } => {
                write!(f, "Concept map '{map}' targets unknown resource type '{resource_type}'")
            }
            Self::UnknownField {
                map,
                resource_type,
                field,
            } => write!(f, "Concept map '{map}' targets unknown field '{resource_type}.{field}'"),
            Self::NotConceptField {
                map,
                resource_type,
                field,
            } => write!(
                f,
                "Concept map '{map}' targets '{resource_type}.{field}', which cannot hold a CodeableConcept"
            ),
            Self::EmptyTarget { map, code } => {
                write!(f, "Concept map '{map}' has no target for source code '{code}'")
            }
            Self::DuplicateMap(map) => write!(f, "Concept map '{map}' is declared twice"),
        }
    }
}

impl std::error::Error for MappingError {}
