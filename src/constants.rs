use serde::Serialize;

use crate::error::EmlError;

/// Sentinel emitted for any organization constant that cannot be resolved.
pub const NOT_SUPPLIED: &str = "Not Supplied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKey {
    ProviderUrl,
    OrganizationName,
    OrganizationUrl,
    IntellectualRights,
    TaxonomicProviderUrl,
}

impl ConstantKey {
    pub const ALL: [ConstantKey; 5] = [
        ConstantKey::ProviderUrl,
        ConstantKey::OrganizationName,
        ConstantKey::OrganizationUrl,
        ConstantKey::IntellectualRights,
        ConstantKey::TaxonomicProviderUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstantKey::ProviderUrl => "EML_PROVIDER_URL",
            ConstantKey::OrganizationName => "EML_ORGANIZATION_NAME",
            ConstantKey::OrganizationUrl => "EML_ORGANIZATION_URL",
            ConstantKey::IntellectualRights => "EML_INTELLECTUAL_RIGHTS",
            ConstantKey::TaxonomicProviderUrl => "EML_TAXONOMIC_PROVIDER_URL",
        }
    }
}

/// Organization-level values used by the EML root and dataset sections.
///
/// Built once per compilation; every field is populated, unresolved keys
/// carrying [`NOT_SUPPLIED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmlConstants {
    pub provider_url: String,
    pub organization_name: String,
    pub organization_url: String,
    pub intellectual_rights: String,
    pub taxonomic_provider_url: String,
}

impl EmlConstants {
    /// Resolves every key through `lookup` in one pass.
    pub fn resolve<F>(mut lookup: F) -> Self
    where
        F: FnMut(ConstantKey) -> Option<String>,
    {
        let mut value = |key| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| NOT_SUPPLIED.to_string())
        };
        Self {
            provider_url: value(ConstantKey::ProviderUrl),
            organization_name: value(ConstantKey::OrganizationName),
            organization_url: value(ConstantKey::OrganizationUrl),
            intellectual_rights: value(ConstantKey::IntellectualRights),
            taxonomic_provider_url: value(ConstantKey::TaxonomicProviderUrl),
        }
    }

    pub fn not_supplied() -> Self {
        Self::resolve(|_| None)
    }

    pub fn get(&self, key: ConstantKey) -> &str {
        match key {
            ConstantKey::ProviderUrl => &self.provider_url,
            ConstantKey::OrganizationName => &self.organization_name,
            ConstantKey::OrganizationUrl => &self.organization_url,
            ConstantKey::IntellectualRights => &self.intellectual_rights,
            ConstantKey::TaxonomicProviderUrl => &self.taxonomic_provider_url,
        }
    }
}

/// Supplies organization constants as a single immutable batch.
pub trait ConstantsProvider: Send + Sync {
    fn constants(&self) -> Result<EmlConstants, EmlError>;
}

impl ConstantsProvider for EmlConstants {
    fn constants(&self) -> Result<EmlConstants, EmlError> {
        Ok(self.clone())
    }
}
