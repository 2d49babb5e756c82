use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{GeneticProfileId, ImportSpecifier};
use crate::error::KiraError;

pub const DEFAULT_CONFIG_FILE: &str = "kira-scx.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ImportEntry {
    Shorthand(String),
    Detailed(ImportEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ImportEntryObject {
    pub file: String,
    pub profile_id: i64,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub database: Option<Utf8PathBuf>,
    pub imports: Vec<ImportSpecifier>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(KiraError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let imports = config
            .imports
            .into_iter()
            .map(|entry| match entry {
                ImportEntry::Shorthand(value) => value.parse(),
                ImportEntry::Detailed(obj) => {
                    if obj.file.trim().is_empty() {
                        return Err(KiraError::InvalidImportSpecifier(format!(
                            "{}:",
                            obj.profile_id
                        )));
                    }
                    Ok(ImportSpecifier {
                        profile_id: GeneticProfileId::try_from(obj.profile_id)?,
                        file: Utf8PathBuf::from(obj.file),
                    })
                }
            })
            .collect::<Result<Vec<_>, KiraError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            database: config.database.map(Utf8PathBuf::from),
            imports,
        })
    }
}
