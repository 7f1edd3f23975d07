use thiserror::Error;

/// Errors raised while constructing model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid tenant mnemonic: {0:?}")]
    InvalidTenant(String),
}

/// Contract violations in the node schema or the transformer registrations.
///
/// These indicate a schema or registration bug and are never a normal
/// pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("rule removed required field `{field}` of {node}")]
    RequiredFieldRemoved {
        node: &'static str,
        field: &'static str,
    },
    #[error("field `{field}` of {node} expects {expected}, got {found}")]
    FieldTypeMismatch {
        node: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{node} has no field `{field}`")]
    UnknownField {
        node: &'static str,
        field: &'static str,
    },
    #[error("cannot re-tag a {found} payload as {tag}")]
    VariantMismatch {
        tag: &'static str,
        found: &'static str,
    },
    #[error("no default profile transformer registered for {resource_type}")]
    MissingDefaultTransformer { resource_type: String },
    #[error("{resource_type} already has a default profile transformer; cannot register {profile}")]
    DuplicateDefaultTransformer {
        resource_type: String,
        profile: String,
    },
}

pub type Result<T> = std::result::Result<T, TransformError>;
