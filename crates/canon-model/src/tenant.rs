use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Mnemonic of the tenant a pipeline run localizes into.
///
/// Restricted to the id charset (`[A-Za-z0-9.-]`) so localized ids and
/// references stay well-formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tenant(String);

impl Tenant {
    pub fn new(mnemonic: impl Into<String>) -> Result<Self, ModelError> {
        let mnemonic = mnemonic.into();
        let trimmed = mnemonic.trim();
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if trimmed.is_empty() || !valid {
            return Err(ModelError::InvalidTenant(mnemonic));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn mnemonic(&self) -> &str {
        &self.0
    }

    /// The `"<tenant>-"` prefix applied to localized ids.
    pub fn prefix(&self) -> String {
        format!("{}-", self.0)
    }
}

impl TryFrom<String> for Tenant {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tenant> for String {
    fn from(tenant: Tenant) -> Self {
        tenant.0
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
