//! Per-type normalization decisions.

use std::sync::Arc;

use canon_model::{CodeableConcept, Coding, ContactPoint, Element, Extension, Identifier};

use super::systems::canonical_system;
use crate::engine::Rewrite;
use crate::extensions::RECOGNIZED_EXTENSIONS;

pub(super) fn coding(coding: &Arc<Coding>) -> Rewrite {
    match coding.system.as_deref().and_then(canonical_system) {
        Some(system) => Rewrite::Replace(Element::Coding(Arc::new(Coding {
            system: Some(system.to_string()),
            ..Coding::clone(coding)
        }))),
        None => Rewrite::Unchanged,
    }
}

pub(super) fn identifier(identifier: &Arc<Identifier>) -> Rewrite {
    match identifier.system.as_deref().and_then(canonical_system) {
        Some(system) => Rewrite::Replace(Element::Identifier(Arc::new(Identifier {
            system: Some(system.to_string()),
            ..Identifier::clone(identifier)
        }))),
        None => Rewrite::Unchanged,
    }
}

/// The coding whose display can stand in for the concept text: the only
/// user-selected coding, or the only coding when none is selected.
fn text_source(concept: &CodeableConcept) -> Option<&Coding> {
    let mut selected = concept.coding.iter().filter(|coding| coding.is_user_selected());
    match (selected.next(), selected.next()) {
        (Some(only), None) => Some(only.as_ref()),
        (Some(_), Some(_)) => None,
        (None, _) => match concept.coding.as_slice() {
            [only] => Some(only.as_ref()),
            _ => None,
        },
    }
}

pub(super) fn codeable_concept(concept: &Arc<CodeableConcept>) -> Rewrite {
    if concept.text.as_deref().is_some_and(|text| !text.is_empty()) {
        return Rewrite::Unchanged;
    }
    let Some(display) = text_source(concept).and_then(|coding| coding.display.as_deref()) else {
        return Rewrite::Unchanged;
    };
    Rewrite::Replace(Element::CodeableConcept(Arc::new(CodeableConcept {
        text: Some(display.to_string()),
        ..CodeableConcept::clone(concept)
    })))
}

pub(super) fn contact_point(contact: &ContactPoint) -> Rewrite {
    if contact.value.is_none() && contact.system.is_none() {
        Rewrite::Remove
    } else {
        Rewrite::Unchanged
    }
}

pub(super) fn extension(extension: &Extension) -> Rewrite {
    let Some(url) = extension.url.as_deref() else {
        return Rewrite::Remove;
    };
    if RECOGNIZED_EXTENSIONS.contains(&url) {
        return Rewrite::Unchanged;
    }
    if extension.value.is_some() || !extension.extension.is_empty() {
        Rewrite::Unchanged
    } else {
        Rewrite::Remove
    }
}
