//! Concept-map registry backed by a JSON document.
//!
//! # Document format
//!
//! ```json
//! {
//!   "conceptMaps": [{
//!     "id": "observation-code",
//!     "name": "Tenant Observation codes",
//!     "tenant": "abc",
//!     "resourceType": "Observation",
//!     "field": "code",
//!     "entries": [{
//!       "source": { "system": "urn:tenant:abc", "code": "WT" },
//!       "target": [{ "system": "http://loinc.org", "code": "29463-7" }]
//!     }]
//!   }],
//!   "valueSets": [{
//!     "fieldPath": "Observation.code",
//!     "profile": "http://hl7.org/fhir/StructureDefinition/bodyweight",
//!     "codes": [{ "system": "http://loinc.org", "code": "29463-7" }]
//!   }]
//! }
//! ```
//!
//! A map without `tenant` applies to every tenant.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canon_model::{
    CodeableConcept, Coding, DynamicValue, Element, FieldDescriptor, FieldKind, FieldValue,
    IssueMetadata, LocationContext, Resource, Tenant, TransformedValueMap, Validation,
    ValidationIssue,
};
use canon_transform::rebuild_resource;

use crate::error::MappingError;
use crate::registry::{MappingResult, TerminologyRegistry};

/// Issue code for a concept with no mapping.
pub const CONCEPT_MAP_LOOKUP: &str = "NOV_CONMAP_LOOKUP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMapDocument {
    #[serde(default)]
    pub concept_maps: Vec<ConceptMap>,
    #[serde(default)]
    pub value_sets: Vec<ValueSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMap {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub resource_type: String,
    /// Child field holding the concept(s), e.g. `code` or `category`.
    pub field: String,
    pub entries: Vec<ConceptMapEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMapEntry {
    pub source: Coding,
    pub target: Vec<Coding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    pub field_path: String,
    pub profile: String,
    pub codes: Vec<Coding>,
}

fn same_code(left: &Coding, right: &Coding) -> bool {
    left.system == right.system && left.code == right.code
}

impl ConceptMap {
    fn applies_to(&self, tenant: &Tenant) -> bool {
        self.tenant
            .as_deref()
            .is_none_or(|mnemonic| mnemonic == tenant.mnemonic())
    }

    fn is_target(&self, coding: &Coding) -> bool {
        self.entries
            .iter()
            .flat_map(|entry| entry.target.iter())
            .any(|target| same_code(target, coding))
    }

    fn issue(&self, concept: &CodeableConcept, location: LocationContext) -> ValidationIssue {
        let codes: Vec<&str> = concept
            .coding
            .iter()
            .filter_map(|coding| coding.code.as_deref())
            .collect();
        let name = self.name.as_deref().unwrap_or(&self.id);
        ValidationIssue::error(
            CONCEPT_MAP_LOOKUP,
            format!(
                "Tenant source value '{}' has no target defined in {name}",
                codes.join(", ")
            ),
            location,
        )
        .with_metadata(vec![IssueMetadata {
            registry_entry_id: self.id.clone(),
            value_set_name: self.name.clone(),
        }])
    }

    /// Appends the targets of every mapped coding. `None` when the concept
    /// needs no change; an issue is pushed when nothing in it maps.
    fn map_concept(
        &self,
        concept: &Arc<CodeableConcept>,
        location: &LocationContext,
        validation: &mut Validation,
    ) -> Option<Arc<CodeableConcept>> {
        if concept.coding.is_empty() {
            return None;
        }
        let mut matched = false;
        let mut appended: Vec<Coding> = Vec::new();
        for coding in &concept.coding {
            if let Some(entry) = self
                .entries
                .iter()
                .find(|entry| same_code(&entry.source, coding))
            {
                matched = true;
                for target in &entry.target {
                    let present = concept.coding.iter().any(|c| same_code(c, target))
                        || appended.iter().any(|c| same_code(c, target));
                    if !present {
                        appended.push(target.clone());
                    }
                }
            } else if self.is_target(coding) {
                matched = true;
            }
        }
        if !matched {
            validation.push(self.issue(concept, location.clone()));
            return None;
        }
        if appended.is_empty() {
            return None;
        }
        let mut next = CodeableConcept::clone(concept);
        next.coding.extend(appended.into_iter().map(Arc::new));
        Some(Arc::new(next))
    }

    fn map_field(
        &self,
        value: FieldValue,
        location: &LocationContext,
        validation: &mut Validation,
    ) -> Option<FieldValue> {
        match value {
            FieldValue::Single(Some(Element::CodeableConcept(concept))) => self
                .map_concept(&concept, location, validation)
                .map(|next| FieldValue::Single(Some(Element::CodeableConcept(next)))),
            FieldValue::Union(Some(DynamicValue::CodeableConcept(concept))) => self
                .map_concept(&concept, location, validation)
                .map(|next| FieldValue::Union(Some(DynamicValue::CodeableConcept(next)))),
            FieldValue::List(items) => {
                let mut changed = false;
                let next = items
                    .into_iter()
                    .map(|item| match item {
                        Element::CodeableConcept(concept) => {
                            match self.map_concept(&concept, location, validation) {
                                Some(next) => {
                                    changed = true;
                                    Element::CodeableConcept(next)
                                }
                                None => Element::CodeableConcept(concept),
                            }
                        }
                        other => other,
                    })
                    .collect();
                changed.then_some(FieldValue::List(next))
            }
            _ => None,
        }
    }
}

impl ConceptMapDocument {
    /// Checks map targets against the resource catalog.
    pub fn validate(&self) -> Result<(), MappingError> {
        let mut ids = BTreeSet::new();
        for map in &self.concept_maps {
            if !ids.insert(map.id.as_str()) {
                return Err(MappingError::DuplicateMap(map.id.clone()));
            }
            let Some(descriptors) = Resource::descriptors_for(&map.resource_type) else {
                return Err(MappingError::UnknownResourceType {
                    map: map.id.clone(),
                    resource_type: map.resource_type.clone(),
                });
            };
            let Some(descriptor) = descriptors
                .iter()
                .find(|descriptor| descriptor.name == map.field)
            else {
                return Err(MappingError::UnknownField {
                    map: map.id.clone(),
                    resource_type: map.resource_type.clone(),
                    field: map.field.clone(),
                });
            };
            if !holds_concept(descriptor) {
                return Err(MappingError::NotConceptField {
                    map: map.id.clone(),
                    resource_type: map.resource_type.clone(),
                    field: map.field.clone(),
                });
            }
            if let Some(entry) = map.entries.iter().find(|entry| entry.target.is_empty()) {
                return Err(MappingError::EmptyTarget {
                    map: map.id.clone(),
                    code: entry.source.code.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }
}

fn holds_concept(descriptor: &FieldDescriptor) -> bool {
    descriptor.kind == FieldKind::TaggedUnion || descriptor.node_type == Some("CodeableConcept")
}

#[derive(Debug)]
struct Loaded {
    document: ConceptMapDocument,
    loaded_at: DateTime<Utc>,
}

/// In-memory [`TerminologyRegistry`] over a [`ConceptMapDocument`].
///
/// When created from a file, a `force_reload` instant later than the last
/// load re-reads the file.
#[derive(Debug)]
pub struct ConceptMapRegistry {
    state: RwLock<Loaded>,
    path: Option<PathBuf>,
}

impl ConceptMapRegistry {
    pub fn new(document: ConceptMapDocument) -> Result<Self, MappingError> {
        document.validate()?;
        Ok(Self {
            state: RwLock::new(Loaded {
                document,
                loaded_at: Utc::now(),
            }),
            path: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: ConceptMapDocument =
            serde_json::from_str(json).context("Failed to parse concept map document")?;
        Ok(Self::new(document)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = read_document(path)?;
        let mut registry = Self::new(document)
            .with_context(|| format!("Invalid concept map document: {}", path.display()))?;
        registry.path = Some(path.to_path_buf());
        Ok(registry)
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().ok().map(|state| state.loaded_at)
    }

    pub fn map_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.document.concept_maps.len())
            .unwrap_or(0)
    }

    fn refresh(&self, as_of: Option<DateTime<Utc>>) -> Result<()> {
        let (Some(as_of), Some(path)) = (as_of, &self.path) else {
            return Ok(());
        };
        let fresh = self
            .state
            .read()
            .map_err(|_| anyhow!("concept map cache is poisoned"))?
            .loaded_at
            >= as_of;
        if fresh {
            return Ok(());
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| anyhow!("concept map cache is poisoned"))?;
        if state.loaded_at >= as_of {
            return Ok(());
        }
        let document = read_document(path)?;
        document
            .validate()
            .with_context(|| format!("Invalid concept map document: {}", path.display()))?;
        tracing::info!(path = %path.display(), maps = document.concept_maps.len(), "concept maps reloaded");
        *state = Loaded {
            document,
            loaded_at: Utc::now().max(as_of),
        };
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<ConceptMapDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read concept maps from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse concept maps from {}", path.display()))
}

impl TerminologyRegistry for ConceptMapRegistry {
    fn map_resource(
        &self,
        resource: &Resource,
        tenant: &Tenant,
        force_reload: Option<DateTime<Utc>>,
    ) -> Result<MappingResult> {
        self.refresh(force_reload)?;
        let state = self
            .state
            .read()
            .map_err(|_| anyhow!("concept map cache is poisoned"))?;

        let resource_type = resource.resource_type();
        let element = resource.to_element();
        let mut changes = TransformedValueMap::new();
        let mut validation = Validation::new();
        for map in state
            .document
            .concept_maps
            .iter()
            .filter(|map| map.resource_type == resource_type && map.applies_to(tenant))
        {
            let Some(descriptor) = element
                .descriptors()
                .iter()
                .find(|descriptor| descriptor.name == map.field)
            else {
                continue;
            };
            let current = match changes.get(descriptor.name) {
                Some(value) => value.clone(),
                None => match element.field(descriptor.name) {
                    Some(value) => value,
                    None => continue,
                },
            };
            let location = LocationContext::new(resource_type, descriptor.name);
            if let Some(next) = map.map_field(current, &location, &mut validation) {
                changes.insert(descriptor.name, next);
            }
        }

        let mapped = rebuild_resource(resource, changes)?;
        Ok(MappingResult {
            resource: Some(mapped),
            validation,
        })
    }

    fn required_value_set(&self, field_path: &str, profile: &str) -> Vec<Coding> {
        let Ok(state) = self.state.read() else {
            tracing::warn!(field_path, profile, "concept map cache is poisoned");
            return Vec::new();
        };
        state
            .document
            .value_sets
            .iter()
            .filter(|set| set.field_path == field_path && set.profile == profile)
            .flat_map(|set| set.codes.iter().cloned())
            .collect()
    }
}
