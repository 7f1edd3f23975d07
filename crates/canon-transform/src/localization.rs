//! Tenant-scoped rewriting of record ids and references.

use std::sync::{Arc, LazyLock};

use canon_model::{Element, Id, Reference, Tenant, Uri};
use regex::Regex;

use crate::engine::{Rewrite, Rule};
use crate::extensions::{data_authority_extension, is_data_authority};

/// Fields localization never enters.
const OPAQUE_FIELDS: &[&str] = &["contained", "version_id"];

static LOCAL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)/([A-Za-z0-9\-.]{1,64})(/_history/([A-Za-z0-9\-.]{1,64}))?$")
        .expect("Invalid local reference regex")
});

/// Prefixes `value` with `"<tenant>-"` unless it already starts with it.
///
/// The check is a plain prefix test, so an id that happens to begin with
/// the tenant mnemonic and a hyphen is left as is.
pub fn localize_id(value: &str, tenant: &Tenant) -> String {
    let prefix = tenant.prefix();
    if value.starts_with(&prefix) {
        value.to_string()
    } else {
        format!("{prefix}{value}")
    }
}

/// A `ResourceType/id[/_history/version]` reference split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalReference<'a> {
    pub resource_type: &'a str,
    pub id: &'a str,
    pub version: Option<&'a str>,
}

impl<'a> LocalReference<'a> {
    /// Parses a relative reference; absolute URLs and anchors return `None`.
    pub fn parse(reference: &'a str) -> Option<Self> {
        let captures = LOCAL_REFERENCE.captures(reference)?;
        Some(Self {
            resource_type: captures.get(1)?.as_str(),
            id: captures.get(2)?.as_str(),
            version: captures.get(4).map(|version| version.as_str()),
        })
    }

    pub fn localized(&self, tenant: &Tenant) -> String {
        let id = localize_id(self.id, tenant);
        match self.version {
            Some(version) => format!("{}/{id}/_history/{version}", self.resource_type),
            None => format!("{}/{id}", self.resource_type),
        }
    }
}

/// Localization rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Localizer;

impl Localizer {
    fn id(id: &Id, tenant: &Tenant) -> Rewrite {
        let localized = localize_id(id.as_str(), tenant);
        if localized == id.value {
            Rewrite::Unchanged
        } else {
            Rewrite::Replace(Element::Id(Arc::new(Id::new(localized))))
        }
    }

    fn reference(reference: &Arc<Reference>, tenant: &Tenant) -> Rewrite {
        let Some(parsed) = reference.reference.as_deref().and_then(LocalReference::parse) else {
            return Rewrite::Unchanged;
        };
        let localized = parsed.localized(tenant);
        let type_ = Self::authority_type(reference.type_.as_ref(), parsed.resource_type);
        if reference.reference.as_deref() == Some(localized.as_str()) && type_.is_none() {
            return Rewrite::Unchanged;
        }
        Rewrite::Replace(Element::Reference(Arc::new(Reference {
            reference: Some(localized),
            type_: type_.or_else(|| reference.type_.clone()),
            ..Reference::clone(reference)
        })))
    }

    /// The type field with the data authority marker attached, or `None`
    /// when the marker is already there.
    fn authority_type(current: Option<&Arc<Uri>>, resource_type: &str) -> Option<Arc<Uri>> {
        let mut type_ = match current {
            Some(uri) if uri.extension.iter().any(|ext| is_data_authority(ext)) => return None,
            Some(uri) => Uri::clone(uri),
            None => Uri::new(resource_type),
        };
        type_.extension.push(Arc::new(data_authority_extension()));
        Some(Arc::new(type_))
    }
}

impl Rule for Localizer {
    fn name(&self) -> &'static str {
        "localizer"
    }

    fn rewrite(&self, element: &Element, tenant: &Tenant) -> Rewrite {
        match element {
            Element::Id(id) => Self::id(id, tenant),
            Element::Reference(reference) => Self::reference(reference, tenant),
            _ => Rewrite::Unchanged,
        }
    }

    fn skips_field(&self, field: &str) -> bool {
        OPAQUE_FIELDS.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_versioned_reference() {
        let parsed = LocalReference::parse("Patient/123/_history/2").unwrap();
        assert_eq!(parsed.resource_type, "Patient");
        assert_eq!(parsed.id, "123");
        assert_eq!(parsed.version, Some("2"));
    }

    #[test]
    fn test_rejects_absolute_and_anchor_references() {
        assert!(LocalReference::parse("http://example.org/fhir/Patient/123").is_none());
        assert!(LocalReference::parse("#5678").is_none());
        assert!(LocalReference::parse("Patient/").is_none());
    }

    #[test]
    fn test_localizes_versioned_reference() {
        let tenant = Tenant::new("abc").unwrap();
        let parsed = LocalReference::parse("Patient/123/_history/2").unwrap();
        assert_eq!(parsed.localized(&tenant), "Patient/abc-123/_history/2");
    }
}
