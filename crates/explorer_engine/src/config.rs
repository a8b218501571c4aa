use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::DEFAULT_RENDERER_BASE;
use crate::drive::{DriveSettings, DEFAULT_FILES_ENDPOINT};
use crate::storage::StorageError;
use crate::ExplorerError;

pub const API_KEY_ENV: &str = "DRIVE_API_KEY";
pub const ROOT_FOLDER_ENV: &str = "DRIVE_ROOT_FOLDER_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key missing")]
    MissingApiKey,
    #[error("root folder id missing")]
    MissingRootFolder,
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("cannot build drive client: {0}")]
    Client(ExplorerError),
}

/// Everything the explorer needs to start. Every field has a default so a
/// config file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub api_key: String,
    pub root_folder_id: String,
    pub files_endpoint: String,
    pub durable_ttl_secs: u64,
    /// Directory of the durable store.
    pub storage_dir: PathBuf,
    /// Byte budget of the durable store; unlimited when absent.
    pub storage_quota: Option<u64>,
    pub renderer_base: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub max_document_bytes: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let drive = DriveSettings::default();
        Self {
            api_key: String::new(),
            root_folder_id: String::new(),
            files_endpoint: DEFAULT_FILES_ENDPOINT.to_string(),
            durable_ttl_secs: 30 * 60,
            storage_dir: PathBuf::from("explorer_store"),
            storage_quota: None,
            renderer_base: DEFAULT_RENDERER_BASE.to_string(),
            connect_timeout_secs: drive.connect_timeout.as_secs(),
            request_timeout_secs: drive.request_timeout.as_secs(),
            page_size: drive.page_size,
            max_document_bytes: drive.max_document_bytes,
        }
    }
}

impl ExplorerConfig {
    /// Non-empty values from `lookup` replace the API key and root id.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = present(API_KEY_ENV) {
            self.api_key = key;
        }
        if let Some(root) = present(ROOT_FOLDER_ENV) {
            self.root_folder_id = root;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.root_folder_id.trim().is_empty() {
            return Err(ConfigError::MissingRootFolder);
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        Ok(())
    }

    pub fn durable_ttl(&self) -> Duration {
        Duration::from_secs(self.durable_ttl_secs)
    }

    pub fn drive_settings(&self) -> DriveSettings {
        DriveSettings {
            files_endpoint: self.files_endpoint.clone(),
            api_key: self.api_key.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            page_size: self.page_size,
            max_document_bytes: self.max_document_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ExplorerConfig};

    #[test]
    fn overrides_fill_missing_credentials() {
        let config = ExplorerConfig::default().with_overrides(|name| match name {
            "DRIVE_API_KEY" => Some("key-1".to_string()),
            "DRIVE_ROOT_FOLDER_ID" => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.api_key, "key-1");
        assert!(matches!(config.validate(), Err(ConfigError::MissingRootFolder)));
    }

    #[test]
    fn defaults_match_the_drive_protocol() {
        let settings = ExplorerConfig::default().drive_settings();
        assert_eq!(settings.page_size, 1000);
        assert_eq!(ExplorerConfig::default().durable_ttl().as_secs(), 1800);
    }
}
