//! Legacy code-system identifiers and their canonical URIs.

const OID_NAMESPACE: &str = "urn:oid:";

/// Legacy OID (with the `urn:oid:` namespace) to canonical system URI.
const LEGACY_SYSTEMS: &[(&str, &str)] = &[
    ("urn:oid:2.16.840.1.113883.6.1", "http://loinc.org"),
    ("urn:oid:2.16.840.1.113883.6.96", "http://snomed.info/sct"),
    (
        "urn:oid:2.16.840.1.113883.6.88",
        "http://www.nlm.nih.gov/research/umls/rxnorm",
    ),
    ("urn:oid:2.16.840.1.113883.6.90", "http://hl7.org/fhir/sid/icd-10-cm"),
    ("urn:oid:2.16.840.1.113883.6.69", "http://hl7.org/fhir/sid/ndc"),
    ("urn:oid:2.16.840.1.113883.6.12", "http://www.ama-assn.org/go/cpt"),
    ("urn:oid:2.16.840.1.113883.12.292", "http://hl7.org/fhir/sid/cvx"),
    ("urn:oid:2.16.840.1.113883.4.1", "http://hl7.org/fhir/sid/us-ssn"),
    ("urn:oid:2.16.840.1.113883.4.6", "http://hl7.org/fhir/sid/us-npi"),
];

fn strip_namespace(system: &str) -> &str {
    system.strip_prefix(OID_NAMESPACE).unwrap_or(system)
}

/// Resolves a legacy system identifier to its canonical URI.
///
/// Tries an exact match first, then compares with the `urn:oid:` namespace
/// stripped from both sides so bare OIDs resolve too.
pub fn canonical_system(system: &str) -> Option<&'static str> {
    let trimmed = system.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some((_, uri)) = LEGACY_SYSTEMS.iter().find(|(legacy, _)| *legacy == trimmed) {
        return Some(*uri);
    }
    let bare = strip_namespace(trimmed);
    LEGACY_SYSTEMS
        .iter()
        .find(|(legacy, _)| strip_namespace(legacy) == bare)
        .map(|(_, uri)| *uri)
}
