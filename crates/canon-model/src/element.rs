//! The closed set of node handles walked by the transformer.

use std::sync::Arc;

use crate::datatypes::{
    CodeableConcept, Coding, ContactPoint, Extension, HumanName, Id, Identifier, Meta, Period,
    Quantity, Reference, Uri,
};
use crate::error::TransformError;
use crate::node::{FieldDescriptor, FieldValue, Node, TransformedValueMap};
use crate::resources::Resource;

/// A shared handle to any node in a record graph.
///
/// Cloning an element clones the `Arc`, so an unchanged subtree keeps its
/// identity through a rebuild; see [`Element::ptr_eq`].
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Id(Arc<Id>),
    Extension(Arc<Extension>),
    Coding(Arc<Coding>),
    CodeableConcept(Arc<CodeableConcept>),
    Identifier(Arc<Identifier>),
    ContactPoint(Arc<ContactPoint>),
    HumanName(Arc<HumanName>),
    Period(Arc<Period>),
    Quantity(Arc<Quantity>),
    Uri(Arc<Uri>),
    Reference(Arc<Reference>),
    Meta(Arc<Meta>),
    Resource(Resource),
}

/// Runs `$body` with `$node` bound to the typed `Arc` inside an element.
macro_rules! with_node {
    ($element:expr, |$node:ident| $body:expr) => {
        match $element {
            Element::Id($node) => $body,
            Element::Extension($node) => $body,
            Element::Coding($node) => $body,
            Element::CodeableConcept($node) => $body,
            Element::Identifier($node) => $body,
            Element::ContactPoint($node) => $body,
            Element::HumanName($node) => $body,
            Element::Period($node) => $body,
            Element::Quantity($node) => $body,
            Element::Uri($node) => $body,
            Element::Reference($node) => $body,
            Element::Meta($node) => $body,
            Element::Resource(Resource::Patient($node)) => $body,
            Element::Resource(Resource::Practitioner($node)) => $body,
            Element::Resource(Resource::Observation($node)) => $body,
            Element::Resource(Resource::Condition($node)) => $body,
            Element::Resource(Resource::Medication($node)) => $body,
            Element::Resource(Resource::MedicationRequest($node)) => $body,
            Element::Resource(Resource::MedicationStatement($node)) => $body,
        }
    };
}

fn type_name_of<T: Node>(_node: &Arc<T>) -> &'static str {
    T::NAME
}

fn descriptors_of<T: Node>(_node: &Arc<T>) -> &'static [FieldDescriptor] {
    T::descriptors()
}

fn rebuilt<T: Node>(node: &Arc<T>, changes: TransformedValueMap) -> Result<Element, TransformError> {
    Ok(T::wrap(Arc::new(node.with_fields(changes)?)))
}

fn address_of<T>(node: &Arc<T>) -> *const () {
    Arc::as_ptr(node).cast()
}

impl Element {
    pub fn type_name(&self) -> &'static str {
        with_node!(self, |node| type_name_of(node))
    }

    /// Child field schema of the node's type.
    pub fn descriptors(&self) -> &'static [FieldDescriptor] {
        with_node!(self, |node| descriptors_of(node))
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        with_node!(self, |node| node.field(name))
    }

    /// Copies the node with the given fields overridden.
    pub fn with_fields(&self, changes: TransformedValueMap) -> Result<Element, TransformError> {
        with_node!(self, |node| rebuilt(node, changes))
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        let left = with_node!(self, |node| address_of(node));
        let right = with_node!(other, |node| address_of(node));
        self.type_name() == other.type_name() && std::ptr::eq(left, right)
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Element::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Element::Resource(resource) => Some(resource),
            _ => None,
        }
    }
}

impl From<Resource> for Element {
    fn from(resource: Resource) -> Self {
        Element::Resource(resource)
    }
}
