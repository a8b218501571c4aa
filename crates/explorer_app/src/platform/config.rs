use std::fs;
use std::path::Path;

use explorer_engine::{ConfigError, ExplorerConfig};
use explorer_logging::{explorer_info, explorer_warn};

pub(crate) const CONFIG_FILENAME: &str = "explorer.ron";

/// Reads `path` as RON. A missing file yields the defaults; a file that does
/// not parse is an error.
pub(crate) fn load_config_file(path: &Path) -> Result<ExplorerConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            explorer_warn!("No config at {:?}; using defaults", path);
            return Ok(ExplorerConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Invalid(format!("cannot read {path:?}: {err}")));
        }
    };

    let config: ExplorerConfig = ron::from_str(&content)
        .map_err(|err| ConfigError::Invalid(format!("{path:?}: {err}")))?;
    explorer_info!("Loaded config from {:?}", path);
    Ok(config)
}

/// File, then environment overrides, then validation.
pub(crate) fn load_config(path: &Path) -> Result<ExplorerConfig, ConfigError> {
    let config = load_config_file(path)?.with_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use explorer_engine::ExplorerConfig;

    use super::{load_config_file, CONFIG_FILENAME};

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(api_key: "k", root_folder_id: "root-1", durable_ttl_secs: 60)"#,
        )
        .expect("write");

        let config = load_config_file(&path).expect("config");

        assert_eq!(config.api_key, "k");
        assert_eq!(config.root_folder_id, "root-1");
        assert_eq!(config.durable_ttl_secs, 60);
        assert_eq!(config.renderer_base, ExplorerConfig::default().renderer_base);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_file(&dir.path().join("absent.ron")).expect("defaults");
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "(api_key: ").expect("write");
        assert!(load_config_file(&path).is_err());
    }
}
