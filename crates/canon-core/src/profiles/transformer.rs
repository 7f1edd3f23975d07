//! Profile transformer trait and registry.
//!
//! Each resource type has exactly one default transformer and any number of
//! profile-specific ones. A specific transformer applies only when its
//! [`ProfileTransformer::qualifies`] check passes; the default runs only
//! when none qualifies.

use std::collections::BTreeMap;
use std::sync::Arc;

use canon_map::TerminologyRegistry;
use canon_model::{Resource, Tenant, TransformError, Validation};

/// Output of a successful profile transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub resource: Resource,
    /// Resources extracted from the input.
    pub embedded: Vec<Resource>,
}

impl TransformOutput {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            embedded: Vec::new(),
        }
    }
}

/// Result of one transformer: `output` is `None` when the resource cannot
/// conform to the profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformResponse {
    pub output: Option<TransformOutput>,
    pub validation: Validation,
}

impl TransformResponse {
    pub fn success(output: TransformOutput) -> Self {
        Self {
            output: Some(output),
            validation: Validation::new(),
        }
    }

    pub fn failure(validation: Validation) -> Self {
        Self {
            output: None,
            validation,
        }
    }
}

/// Restructures a resource to conform to one profile.
pub trait ProfileTransformer: Send + Sync {
    /// Runtime type this transformer handles (e.g. "Observation").
    fn resource_type(&self) -> &'static str;

    /// Canonical URL of the profile.
    fn profile(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "Profile transformer"
    }

    fn is_default(&self) -> bool {
        false
    }

    /// Side-effect free check over the resource's current field values.
    /// Never consulted for the default transformer.
    fn qualifies(&self, _resource: &Resource) -> bool {
        false
    }

    fn transform(
        &self,
        resource: &Resource,
        tenant: &Tenant,
    ) -> Result<TransformResponse, TransformError>;
}

/// Outcome of dispatching one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// `None` when a transformer failed.
    pub output: Option<TransformOutput>,
    /// Issues from every transformer that ran.
    pub validation: Validation,
    /// Profiles of the transformers that ran, in order.
    pub applied: Vec<&'static str>,
}

/// Transformers indexed by resource type, in registration order.
#[derive(Default)]
pub struct ProfileRegistry {
    transformers: BTreeMap<&'static str, Vec<Box<dyn ProfileTransformer>>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transformer. A second default for the same type is a
    /// configuration error.
    pub fn register(
        &mut self,
        transformer: Box<dyn ProfileTransformer>,
    ) -> Result<(), TransformError> {
        let resource_type = transformer.resource_type();
        let entries = self.transformers.entry(resource_type).or_default();
        if transformer.is_default() && entries.iter().any(|entry| entry.is_default()) {
            return Err(TransformError::DuplicateDefaultTransformer {
                resource_type: resource_type.to_string(),
                profile: transformer.profile().to_string(),
            });
        }
        entries.push(transformer);
        Ok(())
    }

    pub fn get(&self, resource_type: &str) -> &[Box<dyn ProfileTransformer>] {
        self.transformers
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn default_for(&self, resource_type: &str) -> Option<&dyn ProfileTransformer> {
        self.get(resource_type)
            .iter()
            .find(|transformer| transformer.is_default())
            .map(|transformer| transformer.as_ref())
    }

    pub fn specific_for(
        &self,
        resource_type: &str,
    ) -> impl Iterator<Item = &dyn ProfileTransformer> + '_ {
        self.get(resource_type)
            .iter()
            .filter(|transformer| !transformer.is_default())
            .map(|transformer| transformer.as_ref())
    }

    /// Returns an iterator over all registered resource types.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transformers.keys().copied()
    }

    /// Number of registered transformers, defaults included.
    pub fn len(&self) -> usize {
        self.transformers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Runs the qualified specific transformers in order, or the default
    /// when none qualifies.
    pub fn dispatch(
        &self,
        resource: &Resource,
        tenant: &Tenant,
    ) -> Result<Dispatch, TransformError> {
        let resource_type = resource.resource_type();
        let qualified: Vec<&dyn ProfileTransformer> = self
            .specific_for(resource_type)
            .filter(|transformer| transformer.qualifies(resource))
            .collect();

        if qualified.is_empty() {
            let default = self.default_for(resource_type).ok_or_else(|| {
                TransformError::MissingDefaultTransformer {
                    resource_type: resource_type.to_string(),
                }
            })?;
            tracing::debug!(profile = default.profile(), "applying default profile");
            let response = default.transform(resource, tenant)?;
            return Ok(Dispatch {
                output: response.output,
                validation: response.validation,
                applied: vec![default.profile()],
            });
        }

        let mut current = resource.clone();
        let mut embedded = Vec::new();
        let mut validation = Validation::new();
        let mut applied = Vec::with_capacity(qualified.len());
        for transformer in qualified {
            tracing::debug!(profile = transformer.profile(), "applying profile");
            let response = transformer.transform(&current, tenant)?;
            validation.merge(response.validation);
            applied.push(transformer.profile());
            let Some(output) = response.output else {
                return Ok(Dispatch {
                    output: None,
                    validation,
                    applied,
                });
            };
            current = output.resource;
            embedded.extend(output.embedded);
        }
        Ok(Dispatch {
            output: Some(TransformOutput {
                resource: current,
                embedded,
            }),
            validation,
            applied,
        })
    }
}

/// Builds the standard transformer catalog.
///
/// The body weight transformer reads its qualifying codes from `terminology`.
pub fn build_default_registry(
    terminology: Arc<dyn TerminologyRegistry>,
) -> Result<ProfileRegistry, TransformError> {
    use super::condition::{ConditionDefault, ProblemListItem};
    use super::medication::{
        MedicationDefault, MedicationRequestDefault, MedicationStatementDefault,
    };
    use super::observation::{BodyWeight, Laboratory, ObservationDefault, VitalSigns};
    use super::patient::{PatientDefault, PractitionerDefault};

    let mut registry = ProfileRegistry::new();
    registry.register(Box::new(PatientDefault))?;
    registry.register(Box::new(PractitionerDefault))?;
    registry.register(Box::new(ObservationDefault))?;
    registry.register(Box::new(VitalSigns))?;
    registry.register(Box::new(Laboratory))?;
    registry.register(Box::new(BodyWeight::new(terminology)))?;
    registry.register(Box::new(ConditionDefault))?;
    registry.register(Box::new(ProblemListItem))?;
    registry.register(Box::new(MedicationDefault))?;
    registry.register(Box::new(MedicationRequestDefault))?;
    registry.register(Box::new(MedicationStatementDefault))?;
    Ok(registry)
}
