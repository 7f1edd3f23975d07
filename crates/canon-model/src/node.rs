//! Static field schema shared by every node in a record graph.
//!
//! A node is an immutable record reached from a resource root through named
//! fields. Each node type declares which of its fields hold other nodes
//! (its *children*); plain data such as strings and flags is not part of the
//! schema and is copied verbatim on rebuild.
//!
//! The schema is produced once per node type by [`impl_node!`]: the macro
//! derives the [`FieldDescriptor`] table from the child fields' Rust types
//! (through [`FieldSlot`]), a by-name field reader, and the "with fields"
//! rebuild that overrides only the named fields.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::dynamic::DynamicValue;
use crate::element::Element;
use crate::error::TransformError;
use crate::resources::Resource;

/// Shape of a child field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A value type without children of its own (e.g. [`crate::Id`]).
    Scalar,
    /// A single nested node.
    SingleNode,
    /// An ordered list of nodes.
    NodeList,
    /// A choice-type value whose active variant may carry a node.
    TaggedUnion,
}

/// Name and shape of one child field of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required fields can be replaced but never cleared.
    pub required: bool,
    /// Node type held by the field; `None` for choice-type fields.
    pub node_type: Option<&'static str>,
}

/// Current (or replacement) value of a child field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Option<Element>),
    List(Vec<Element>),
    Union(Option<DynamicValue>),
}

/// Replacement values keyed by field name, collected while walking one node.
///
/// An empty map means the node is returned unchanged.
pub type TransformedValueMap = BTreeMap<&'static str, FieldValue>;

/// A node type participating in the transformation graph.
pub trait Node: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    const NAME: &'static str;
    /// Scalar value types are visited by rules but never have children.
    const SCALAR: bool = false;

    fn descriptors() -> &'static [FieldDescriptor];

    /// Reads a child field by name; `None` when the field is not a child.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Copies the node, overriding exactly the fields present in `changes`.
    fn with_fields(&self, changes: TransformedValueMap) -> Result<Self, TransformError>;

    fn wrap(node: Arc<Self>) -> Element;

    fn unwrap(element: Element) -> Option<Arc<Self>>;
}

/// Storage shape of a child field.
///
/// The Rust type of a field decides its [`FieldKind`] and whether it is
/// required, so the schema can never drift from the struct definition.
pub trait FieldSlot: Sized {
    const KIND: FieldKind;
    const REQUIRED: bool;
    const NODE_TYPE: Option<&'static str>;

    fn read(&self) -> FieldValue;

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError>;
}

const fn single_kind<T: Node>() -> FieldKind {
    if T::SCALAR {
        FieldKind::Scalar
    } else {
        FieldKind::SingleNode
    }
}

fn downcast<T: Node>(
    element: Element,
    node: &'static str,
    field: &'static str,
) -> Result<Arc<T>, TransformError> {
    let found = element.type_name();
    T::unwrap(element).ok_or(TransformError::FieldTypeMismatch {
        node,
        field,
        expected: T::NAME,
        found,
    })
}

fn shape_mismatch(
    value: &FieldValue,
    node: &'static str,
    field: &'static str,
    expected: &'static str,
) -> TransformError {
    let found = match value {
        FieldValue::Single(_) => "single value",
        FieldValue::List(_) => "list",
        FieldValue::Union(_) => "tagged union",
    };
    TransformError::FieldTypeMismatch {
        node,
        field,
        expected,
        found,
    }
}

impl<T: Node> FieldSlot for Option<Arc<T>> {
    const KIND: FieldKind = single_kind::<T>();
    const REQUIRED: bool = false;
    const NODE_TYPE: Option<&'static str> = Some(T::NAME);

    fn read(&self) -> FieldValue {
        FieldValue::Single(self.clone().map(T::wrap))
    }

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError> {
        match value {
            FieldValue::Single(None) => Ok(None),
            FieldValue::Single(Some(element)) => downcast(element, node, field).map(Some),
            other => Err(shape_mismatch(&other, node, field, T::NAME)),
        }
    }
}

impl<T: Node> FieldSlot for Arc<T> {
    const KIND: FieldKind = single_kind::<T>();
    const REQUIRED: bool = true;
    const NODE_TYPE: Option<&'static str> = Some(T::NAME);

    fn read(&self) -> FieldValue {
        FieldValue::Single(Some(T::wrap(Arc::clone(self))))
    }

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError> {
        match value {
            FieldValue::Single(Some(element)) => downcast(element, node, field),
            FieldValue::Single(None) => Err(TransformError::RequiredFieldRemoved { node, field }),
            other => Err(shape_mismatch(&other, node, field, T::NAME)),
        }
    }
}

impl<T: Node> FieldSlot for Vec<Arc<T>> {
    const KIND: FieldKind = FieldKind::NodeList;
    const REQUIRED: bool = false;
    const NODE_TYPE: Option<&'static str> = Some(T::NAME);

    fn read(&self) -> FieldValue {
        FieldValue::List(self.iter().cloned().map(T::wrap).collect())
    }

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError> {
        match value {
            FieldValue::List(items) => items
                .into_iter()
                .map(|element| downcast(element, node, field))
                .collect(),
            other => Err(shape_mismatch(&other, node, field, T::NAME)),
        }
    }
}

impl FieldSlot for Vec<Resource> {
    const KIND: FieldKind = FieldKind::NodeList;
    const REQUIRED: bool = false;
    const NODE_TYPE: Option<&'static str> = Some("Resource");

    fn read(&self) -> FieldValue {
        FieldValue::List(self.iter().cloned().map(Element::Resource).collect())
    }

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError> {
        match value {
            FieldValue::List(items) => items
                .into_iter()
                .map(|element| match element {
                    Element::Resource(resource) => Ok(resource),
                    other => Err(TransformError::FieldTypeMismatch {
                        node,
                        field,
                        expected: "Resource",
                        found: other.type_name(),
                    }),
                })
                .collect(),
            other => Err(shape_mismatch(&other, node, field, "Resource")),
        }
    }
}

impl FieldSlot for Option<DynamicValue> {
    const KIND: FieldKind = FieldKind::TaggedUnion;
    const REQUIRED: bool = false;
    const NODE_TYPE: Option<&'static str> = None;

    fn read(&self) -> FieldValue {
        FieldValue::Union(self.clone())
    }

    fn write(
        value: FieldValue,
        node: &'static str,
        field: &'static str,
    ) -> Result<Self, TransformError> {
        match value {
            FieldValue::Union(value) => Ok(value),
            other => Err(shape_mismatch(&other, node, field, "DynamicValue")),
        }
    }
}

/// Builds the descriptor for one child field from an accessor.
///
/// Only the accessor's type is used; it ties the descriptor to the field's
/// declared storage shape.
pub fn describe<N, S, F>(name: &'static str, _accessor: F) -> FieldDescriptor
where
    S: FieldSlot,
    F: Fn(&N) -> &S,
{
    FieldDescriptor {
        name,
        kind: S::KIND,
        required: S::REQUIRED,
        node_type: S::NODE_TYPE,
    }
}

/// Implements [`Node`] for a struct from the list of its child fields.
///
/// ```ignore
/// impl_node!(element Coding { extension });
/// impl_node!(scalar Id);
/// impl_node!(resource Patient { id, meta, extension, contained, identifier });
/// ```
macro_rules! impl_node {
    (@schema $ty:ident, [$($child:ident),*]) => {
        fn descriptors() -> &'static [$crate::node::FieldDescriptor] {
            static DESCRIPTORS: ::std::sync::OnceLock<Vec<$crate::node::FieldDescriptor>> =
                ::std::sync::OnceLock::new();
            DESCRIPTORS.get_or_init(|| {
                vec![$($crate::node::describe(stringify!($child), |node: &$ty| &node.$child)),*]
            })
        }

        fn field(&self, name: &str) -> Option<$crate::node::FieldValue> {
            match name {
                $(stringify!($child) => Some($crate::node::FieldSlot::read(&self.$child)),)*
                _ => None,
            }
        }

        fn with_fields(
            &self,
            changes: $crate::node::TransformedValueMap,
        ) -> Result<Self, $crate::error::TransformError> {
            #[allow(unused_mut)]
            let mut changes = changes;
            #[allow(unused_mut)]
            let mut next = self.clone();
            $(
                if let Some(value) = changes.remove(stringify!($child)) {
                    next.$child = $crate::node::FieldSlot::write(
                        value,
                        <Self as $crate::node::Node>::NAME,
                        stringify!($child),
                    )?;
                }
            )*
            match changes.into_keys().next() {
                Some(field) => Err($crate::error::TransformError::UnknownField {
                    node: <Self as $crate::node::Node>::NAME,
                    field,
                }),
                None => Ok(next),
            }
        }
    };
    (scalar $ty:ident) => {
        impl $crate::node::Node for $ty {
            const NAME: &'static str = stringify!($ty);
            const SCALAR: bool = true;

            $crate::node::impl_node!(@schema $ty, []);

            fn wrap(node: ::std::sync::Arc<Self>) -> $crate::element::Element {
                $crate::element::Element::$ty(node)
            }

            fn unwrap(element: $crate::element::Element) -> Option<::std::sync::Arc<Self>> {
                match element {
                    $crate::element::Element::$ty(node) => Some(node),
                    _ => None,
                }
            }
        }
    };
    (element $ty:ident { $($child:ident),* $(,)? }) => {
        impl $crate::node::Node for $ty {
            const NAME: &'static str = stringify!($ty);

            $crate::node::impl_node!(@schema $ty, [$($child),*]);

            fn wrap(node: ::std::sync::Arc<Self>) -> $crate::element::Element {
                $crate::element::Element::$ty(node)
            }

            fn unwrap(element: $crate::element::Element) -> Option<::std::sync::Arc<Self>> {
                match element {
                    $crate::element::Element::$ty(node) => Some(node),
                    _ => None,
                }
            }
        }
    };
    (resource $ty:ident { $($child:ident),* $(,)? }) => {
        impl $crate::node::Node for $ty {
            const NAME: &'static str = stringify!($ty);

            $crate::node::impl_node!(@schema $ty, [$($child),*]);

            fn wrap(node: ::std::sync::Arc<Self>) -> $crate::element::Element {
                $crate::element::Element::Resource($crate::resources::Resource::$ty(node))
            }

            fn unwrap(element: $crate::element::Element) -> Option<::std::sync::Arc<Self>> {
                match element {
                    $crate::element::Element::Resource($crate::resources::Resource::$ty(node)) => {
                        Some(node)
                    }
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use impl_node;
