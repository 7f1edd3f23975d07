//! Choice-type values (`value[x]`, `medication[x]`, `effective[x]`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::datatypes::{CodeableConcept, Coding, Identifier, Period, Quantity, Reference};
use crate::element::Element;
use crate::error::TransformError;

/// A tagged union over the types a choice field may hold.
///
/// Primitive variants carry no node; node variants expose their payload to
/// the transformer through [`DynamicValue::payload`] and accept a rewritten
/// payload back through [`DynamicValue::rewrap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DynamicValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    DateTime(String),
    CodeableConcept(Arc<CodeableConcept>),
    Coding(Arc<Coding>),
    Reference(Arc<Reference>),
    Quantity(Arc<Quantity>),
    Period(Arc<Period>),
    Identifier(Arc<Identifier>),
}

impl DynamicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::String(_) => "String",
            DynamicValue::Boolean(_) => "Boolean",
            DynamicValue::Integer(_) => "Integer",
            DynamicValue::DateTime(_) => "DateTime",
            DynamicValue::CodeableConcept(_) => "CodeableConcept",
            DynamicValue::Coding(_) => "Coding",
            DynamicValue::Reference(_) => "Reference",
            DynamicValue::Quantity(_) => "Quantity",
            DynamicValue::Period(_) => "Period",
            DynamicValue::Identifier(_) => "Identifier",
        }
    }

    /// The node carried by the active variant, if any.
    pub fn payload(&self) -> Option<Element> {
        match self {
            DynamicValue::String(_)
            | DynamicValue::Boolean(_)
            | DynamicValue::Integer(_)
            | DynamicValue::DateTime(_) => None,
            DynamicValue::CodeableConcept(node) => Some(Element::CodeableConcept(Arc::clone(node))),
            DynamicValue::Coding(node) => Some(Element::Coding(Arc::clone(node))),
            DynamicValue::Reference(node) => Some(Element::Reference(Arc::clone(node))),
            DynamicValue::Quantity(node) => Some(Element::Quantity(Arc::clone(node))),
            DynamicValue::Period(node) => Some(Element::Period(Arc::clone(node))),
            DynamicValue::Identifier(node) => Some(Element::Identifier(Arc::clone(node))),
        }
    }

    /// Wraps `payload` in the same tag as `self`.
    pub fn rewrap(&self, payload: Element) -> Result<DynamicValue, TransformError> {
        match (self, payload) {
            (DynamicValue::CodeableConcept(_), Element::CodeableConcept(node)) => {
                Ok(DynamicValue::CodeableConcept(node))
            }
            (DynamicValue::Coding(_), Element::Coding(node)) => Ok(DynamicValue::Coding(node)),
            (DynamicValue::Reference(_), Element::Reference(node)) => {
                Ok(DynamicValue::Reference(node))
            }
            (DynamicValue::Quantity(_), Element::Quantity(node)) => Ok(DynamicValue::Quantity(node)),
            (DynamicValue::Period(_), Element::Period(node)) => Ok(DynamicValue::Period(node)),
            (DynamicValue::Identifier(_), Element::Identifier(node)) => {
                Ok(DynamicValue::Identifier(node))
            }
            (tagged, payload) => Err(TransformError::VariantMismatch {
                tag: tagged.type_name(),
                found: payload.type_name(),
            }),
        }
    }

    pub fn as_codeable_concept(&self) -> Option<&Arc<CodeableConcept>> {
        match self {
            DynamicValue::CodeableConcept(concept) => Some(concept),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Arc<Reference>> {
        match self {
            DynamicValue::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}
