//! Structural transformer: post-order walk and copy-on-write rebuild.
//!
//! [`run`] walks every child field declared in a node's schema, lets the
//! [`Rule`] rewrite each child after the child's own subtree has been
//! processed, and rebuilds the node with only the changed fields replaced.
//! When nothing below a node changes, the node comes back as the same `Arc`.

use canon_model::{
    Element, FieldDescriptor, FieldKind, FieldValue, Resource, Tenant, TransformError,
    TransformedValueMap,
};

/// Outcome of evaluating one node against a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Unchanged,
    Replace(Element),
    /// Drop the node. Only valid in a list or an optional field.
    Remove,
}

/// Per-type rewrite decisions plugged into [`run`].
///
/// Rules are pure: they never fail and never abort the walk. A rule sees a
/// node after its children have already been rewritten.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(&self, element: &Element, tenant: &Tenant) -> Rewrite;

    /// Fields the walk never enters, whatever node they belong to.
    fn skips_field(&self, _field: &str) -> bool {
        false
    }
}

/// What happened to one child.
enum Visit {
    Kept,
    Replaced(Element),
    Removed,
}

/// Collects replacement values for the children of `element`.
///
/// Untouched fields are absent from the map. A list whose elements were all
/// removed is recorded as an explicit empty list.
pub fn transform_children(
    element: &Element,
    tenant: &Tenant,
    rule: &dyn Rule,
) -> Result<TransformedValueMap, TransformError> {
    let mut changes = TransformedValueMap::new();
    for descriptor in element.descriptors() {
        if rule.skips_field(descriptor.name) {
            continue;
        }
        let Some(value) = element.field(descriptor.name) else {
            continue;
        };
        if let Some(replacement) = transform_field(element, descriptor, value, tenant, rule)? {
            changes.insert(descriptor.name, replacement);
        }
    }
    Ok(changes)
}

/// Applies `changes` to `element`; an empty map returns the same handle.
pub fn rebuild(element: &Element, changes: TransformedValueMap) -> Result<Element, TransformError> {
    if changes.is_empty() {
        return Ok(element.clone());
    }
    element.with_fields(changes)
}

/// [`rebuild`] for a resource root.
pub fn rebuild_resource(
    resource: &Resource,
    changes: TransformedValueMap,
) -> Result<Resource, TransformError> {
    match rebuild(&resource.to_element(), changes)? {
        Element::Resource(next) => Ok(next),
        other => Err(TransformError::FieldTypeMismatch {
            node: resource.resource_type(),
            field: "",
            expected: "Resource",
            found: other.type_name(),
        }),
    }
}

/// Rewrites every descendant of `element` with `rule`.
///
/// The root itself is not offered to the rule.
pub fn run(element: &Element, tenant: &Tenant, rule: &dyn Rule) -> Result<Element, TransformError> {
    let changes = transform_children(element, tenant, rule)?;
    rebuild(element, changes)
}

/// [`run`] for a resource root.
pub fn run_resource(
    resource: &Resource,
    tenant: &Tenant,
    rule: &dyn Rule,
) -> Result<Resource, TransformError> {
    let changes = transform_children(&resource.to_element(), tenant, rule)?;
    rebuild_resource(resource, changes)
}

fn transform_field(
    parent: &Element,
    descriptor: &FieldDescriptor,
    value: FieldValue,
    tenant: &Tenant,
    rule: &dyn Rule,
) -> Result<Option<FieldValue>, TransformError> {
    match value {
        FieldValue::Single(None) | FieldValue::Union(None) => Ok(None),
        FieldValue::Single(Some(child)) => {
            match visit(&child, descriptor.kind, tenant, rule)? {
                Visit::Kept => Ok(None),
                Visit::Replaced(next) => Ok(Some(FieldValue::Single(Some(next)))),
                Visit::Removed => {
                    removable(parent, descriptor)?;
                    Ok(Some(FieldValue::Single(None)))
                }
            }
        }
        FieldValue::List(items) => transform_list(&items, tenant, rule),
        FieldValue::Union(Some(tagged)) => {
            // Primitive variants carry nothing a rule can rewrite.
            let Some(payload) = tagged.payload() else {
                return Ok(None);
            };
            match visit(&payload, FieldKind::SingleNode, tenant, rule)? {
                Visit::Kept => Ok(None),
                Visit::Replaced(next) => Ok(Some(FieldValue::Union(Some(tagged.rewrap(next)?)))),
                Visit::Removed => {
                    removable(parent, descriptor)?;
                    Ok(Some(FieldValue::Union(None)))
                }
            }
        }
    }
}

fn transform_list(
    items: &[Element],
    tenant: &Tenant,
    rule: &dyn Rule,
) -> Result<Option<FieldValue>, TransformError> {
    let mut changed = false;
    let mut next = Vec::with_capacity(items.len());
    for item in items {
        match visit(item, FieldKind::SingleNode, tenant, rule)? {
            Visit::Kept => next.push(item.clone()),
            Visit::Replaced(replacement) => {
                changed = true;
                next.push(replacement);
            }
            Visit::Removed => changed = true,
        }
    }
    Ok(changed.then_some(FieldValue::List(next)))
}

/// Post-order visit: the child's subtree first, then the rule on the result.
fn visit(
    child: &Element,
    kind: FieldKind,
    tenant: &Tenant,
    rule: &dyn Rule,
) -> Result<Visit, TransformError> {
    let rebuilt = match kind {
        FieldKind::Scalar => child.clone(),
        _ => run(child, tenant, rule)?,
    };
    match rule.rewrite(&rebuilt, tenant) {
        Rewrite::Remove => {
            tracing::trace!(rule = rule.name(), node = child.type_name(), "removed");
            Ok(Visit::Removed)
        }
        Rewrite::Replace(replacement) => {
            tracing::trace!(rule = rule.name(), node = child.type_name(), "replaced");
            Ok(Visit::Replaced(replacement))
        }
        Rewrite::Unchanged if rebuilt.ptr_eq(child) => Ok(Visit::Kept),
        Rewrite::Unchanged => Ok(Visit::Replaced(rebuilt)),
    }
}

fn removable(parent: &Element, descriptor: &FieldDescriptor) -> Result<(), TransformError> {
    if descriptor.required {
        return Err(TransformError::RequiredFieldRemoved {
            node: parent.type_name(),
            field: descriptor.name,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use canon_model::{ContactPoint, Id, Patient, Resource};

    use super::*;

    struct Nothing;

    impl Rule for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }

        fn rewrite(&self, _element: &Element, _tenant: &Tenant) -> Rewrite {
            Rewrite::Unchanged
        }
    }

    fn tenant() -> Tenant {
        Tenant::new("t").unwrap()
    }

    #[test]
    fn test_unchanged_tree_keeps_identity() {
        let patient = Resource::from(Patient {
            id: Some(Arc::new(Id::new("p"))),
            telecom: vec![Arc::new(ContactPoint::default())],
            ..Patient::default()
        })
        .to_element();
        let result = run(&patient, &tenant(), &Nothing).unwrap();
        assert!(result.ptr_eq(&patient));
        assert!(transform_children(&patient, &tenant(), &Nothing)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rebuild_with_empty_map_is_identity() {
        let element = Element::Id(Arc::new(Id::new("x")));
        let rebuilt = rebuild(&element, TransformedValueMap::new()).unwrap();
        assert!(rebuilt.ptr_eq(&element));
    }
}
