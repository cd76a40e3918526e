use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::codes::CodeTables;
use crate::constants::{ConstantKey, ConstantsProvider, EmlConstants};
use crate::error::EmlError;

pub const CONFIG_FILE_NAME: &str = "eml.json";
pub const DEFAULT_TAXONOMY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub organization: OrganizationEntry,
    #[serde(default)]
    pub taxonomy: Option<TaxonomyEntry>,
    #[serde(default)]
    pub code_tables: CodeTables,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OrganizationEntry {
    #[serde(default)]
    pub provider_url: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub organization_url: Option<String>,
    #[serde(default)]
    pub intellectual_rights: Option<String>,
    #[serde(default)]
    pub taxonomic_provider_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TaxonomyEntry {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TaxonomySettings {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub constants: EmlConstants,
    pub taxonomy: Option<TaxonomySettings>,
    pub code_tables: CodeTables,
}

impl ConstantsProvider for ResolvedConfig {
    fn constants(&self) -> Result<EmlConstants, EmlError> {
        Ok(self.constants.clone())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `eml.json` from the working directory, falling back
    /// to the platform config directory.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, EmlError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => Self::default_path().ok_or(EmlError::MissingConfig)?,
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| EmlError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| EmlError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "eml-compiler")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, EmlError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let organization = config.organization;

        let constants = EmlConstants::resolve(|key| match key {
            ConstantKey::ProviderUrl => organization.provider_url.clone(),
            ConstantKey::OrganizationName => organization.organization_name.clone(),
            ConstantKey::OrganizationUrl => organization.organization_url.clone(),
            ConstantKey::IntellectualRights => organization.intellectual_rights.clone(),
            ConstantKey::TaxonomicProviderUrl => organization.taxonomic_provider_url.clone(),
        });

        let taxonomy = match config.taxonomy {
            Some(entry) => {
                let base_url = entry.base_url.trim().to_string();
                if base_url.is_empty() {
                    return Err(EmlError::ConfigParse(
                        "taxonomy.base_url must not be empty".to_string(),
                    ));
                }
                Some(TaxonomySettings {
                    base_url,
                    timeout: Duration::from_secs(
                        entry.timeout_secs.unwrap_or(DEFAULT_TAXONOMY_TIMEOUT_SECS),
                    ),
                })
            }
            None => None,
        };

        Ok(ResolvedConfig {
            schema_version,
            constants,
            taxonomy,
            code_tables: config.code_tables,
        })
    }
}
