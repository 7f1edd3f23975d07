//! Promotes inline or contained medications to standalone resources.

use std::sync::Arc;

use canon_model::{
    CodeableConcept, DynamicValue, Element, FieldValue, Id, Medication, Meta, Reference, Resource,
    TransformError, TransformedValueMap,
};

use crate::engine::rebuild_resource;

const ANCHOR: char = '#';

/// An extracted resource and the values the parent must take in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub extracted: Resource,
    /// New value for the parent's choice field.
    pub value: DynamicValue,
    /// New `contained` list, when an entry was consumed from it.
    pub contained: Option<Vec<Resource>>,
}

impl Extraction {
    /// Returns a copy of `parent` with `field` and `contained` replaced.
    pub fn apply(&self, parent: &Resource, field: &'static str) -> Result<Resource, TransformError> {
        let mut changes = TransformedValueMap::new();
        changes.insert(field, FieldValue::Union(Some(self.value.clone())));
        if let Some(contained) = &self.contained {
            changes.insert(
                "contained",
                FieldValue::List(contained.iter().map(Resource::to_element).collect()),
            );
        }
        rebuild_resource(parent, changes)
    }
}

/// Extracts the medication carried by `value` out of `parent`.
///
/// Returns `None` when there is nothing to extract: no value, no parent id,
/// an absolute reference, or an anchor with no matching contained entry.
pub fn extract_medication(
    value: Option<&DynamicValue>,
    contained: &[Resource],
    parent: &Resource,
) -> Result<Option<Extraction>, TransformError> {
    let (Some(value), Some(parent_id)) = (value, parent.id()) else {
        return Ok(None);
    };
    match value {
        DynamicValue::CodeableConcept(concept) => {
            Ok(Some(from_concept(concept, parent_id, parent.source())))
        }
        DynamicValue::Reference(reference) => {
            from_contained(reference, contained, parent_id, parent.source())
        }
        _ => Ok(None),
    }
}

/// `codeable-<parent>-<codes>` from the user-selected codings, or from all
/// codings when none is selected.
pub fn codeable_id(concept: &CodeableConcept, parent_id: &str) -> String {
    let any_selected = concept.coding.iter().any(|coding| coding.is_user_selected());
    let codes: Vec<&str> = concept
        .coding
        .iter()
        .filter(|coding| !any_selected || coding.is_user_selected())
        .filter_map(|coding| coding.code.as_deref())
        .collect();
    format!("codeable-{parent_id}-{}", codes.join("-"))
}

fn provenance(source: Option<&str>) -> Option<Arc<Meta>> {
    source.map(|source| {
        Arc::new(Meta {
            source: Some(source.to_string()),
            ..Meta::default()
        })
    })
}

fn from_concept(concept: &Arc<CodeableConcept>, parent_id: &str, source: Option<&str>) -> Extraction {
    let id = codeable_id(concept, parent_id);
    let medication = Medication {
        id: Some(Arc::new(Id::new(id.as_str()))),
        meta: provenance(source),
        code: Some(Arc::clone(concept)),
        ..Medication::default()
    };
    Extraction {
        extracted: Resource::from(medication),
        value: DynamicValue::Reference(Arc::new(Reference::to_resource("Medication", &id))),
        contained: None,
    }
}

fn from_contained(
    reference: &Reference,
    contained: &[Resource],
    parent_id: &str,
    source: Option<&str>,
) -> Result<Option<Extraction>, TransformError> {
    let Some(anchor) = reference
        .reference
        .as_deref()
        .and_then(|reference| reference.strip_prefix(ANCHOR))
    else {
        return Ok(None);
    };
    if contained.is_empty() {
        return Ok(None);
    }
    let Some(position) = contained.iter().position(|entry| entry.id() == Some(anchor)) else {
        return Ok(None);
    };
    let entry = &contained[position];
    let id = format!("contained-{parent_id}-{anchor}");

    let meta = Meta {
        source: source.map(str::to_string),
        ..entry.meta().map(|meta| Meta::clone(meta)).unwrap_or_default()
    };
    let mut changes = TransformedValueMap::new();
    changes.insert(
        "id",
        FieldValue::Single(Some(Element::Id(Arc::new(Id::new(id.as_str()))))),
    );
    changes.insert("meta", FieldValue::Single(Some(Element::Meta(Arc::new(meta)))));
    let extracted = rebuild_resource(entry, changes)?;

    let remaining = contained
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != position)
        .map(|(_, entry)| entry.clone())
        .collect();
    let resource_type = extracted.resource_type();
    Ok(Some(Extraction {
        value: DynamicValue::Reference(Arc::new(Reference::to_resource(resource_type, &id))),
        extracted,
        contained: Some(remaining),
    }))
}

#[cfg(test)]
mod tests {
    use canon_model::Coding;

    use super::*;

    #[test]
    fn test_codeable_id_prefers_selected_codes() {
        let concept = CodeableConcept::from_codings([
            Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "A").selected(true),
            Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "B"),
        ]);
        assert_eq!(codeable_id(&concept, "1234"), "codeable-1234-A");
    }

    #[test]
    fn test_codeable_id_uses_all_codes_in_order() {
        let concept = CodeableConcept::from_codings([
            Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "A"),
            Coding::new("http://www.nlm.nih.gov/research/umls/rxnorm", "B"),
        ]);
        assert_eq!(codeable_id(&concept, "1234"), "codeable-1234-A-B");
    }
}
