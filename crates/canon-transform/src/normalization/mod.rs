//! Structural canonicalization of clinical resources.
//!
//! - **systems**: legacy code-system OIDs to canonical URIs
//! - **rules**: per-type rewrite decisions (codings, identifiers, concept
//!   text, empty contact points, unrecognized extensions)

mod rules;
pub mod systems;

use canon_model::{Element, Tenant};

use crate::engine::{Rewrite, Rule};

pub use systems::canonical_system;

/// Normalization rule set. Tenant independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Rule for Normalizer {
    fn name(&self) -> &'static str {
        "normalizer"
    }

    fn rewrite(&self, element: &Element, _tenant: &Tenant) -> Rewrite {
        match element {
            Element::Coding(coding) => rules::coding(coding),
            Element::Identifier(identifier) => rules::identifier(identifier),
            Element::CodeableConcept(concept) => rules::codeable_concept(concept),
            Element::ContactPoint(contact) => rules::contact_point(contact),
            Element::Extension(extension) => rules::extension(extension),
            _ => Rewrite::Unchanged,
        }
    }
}
