//! Terminology registry interface consumed by the mapping stage.

use chrono::{DateTime, Utc};

use canon_model::{Coding, Resource, Tenant, Validation};

/// Output of a registry lookup: the best-effort mapped resource and the
/// issues found while mapping it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingResult {
    pub resource: Option<Resource>,
    pub validation: Validation,
}

impl MappingResult {
    pub fn mapped(resource: Resource) -> Self {
        Self {
            resource: Some(resource),
            validation: Validation::new(),
        }
    }
}

/// Concept-map and value-set lookups.
///
/// Implementations own their cache. `force_reload` asks for data no older
/// than the given instant; the registry decides whether its cache is stale.
pub trait TerminologyRegistry: Send + Sync {
    fn map_resource(
        &self,
        resource: &Resource,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> anyhow::Result<MappingResult>;

    /// Codes a profile requires at `field_path` (e.g. `Observation.code`).
    fn required_value_set(&self, field_path: &str, profile: &str) -> Vec<Coding>;
}

/// Registry that maps nothing and requires nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRegistry;

impl TerminologyRegistry for PassthroughRegistry {
    fn map_resource(
        &self,
        resource: &Resource,
        _tenant: &Tenant,
        _force_reload: Option<DateTime<Utc>>,
    ) -> anyhow::Result<MappingResult> {
        Ok(MappingResult::mapped(resource.clone()))
    }

    fn required_value_set(&self, _field_path: &str, _profile: &str) -> Vec<Coding> {
        Vec::new()
    }
}
