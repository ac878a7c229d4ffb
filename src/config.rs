//! Config-file loading.
//!
//! A config file supplies the lowest-precedence values for any declared
//! parameter: the resolution engine adopts a config value only for keys the
//! command line left unset. The format is selected by file extension; an
//! explicitly named file that does not exist is a hard failure, never
//! silently skipped.

use dirs::config_dir;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "apicli";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const DEFAULT_CATALOG_FILE_NAME: &str = "catalog.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("unknown config file extension: .{extension}")]
    UnsupportedFormat { extension: String },
    #[error("failed to parse config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("invalid config file {}: top-level mapping expected", path.display())]
    NotAMapping { path: PathBuf },
}

/// Default config file location, `<config_dir>/apicli/config.yml`.
///
/// The `APICLI_CONFIG_DIR` environment variable overrides the directory,
/// which keeps tests away from the real user configuration.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("APICLI_CONFIG_DIR") {
        let mut path = PathBuf::from(dir);
        path.push(DEFAULT_CONFIGURATION_FILE_NAME);
        return Some(path);
    }

    let mut path = config_dir()?;
    path.push(DEFAULT_APPLICATION_ID);
    path.push(DEFAULT_CONFIGURATION_FILE_NAME);
    Some(path)
}

/// Default catalog location, `<config_dir>/apicli/catalog.json`, honoring
/// the same `APICLI_CONFIG_DIR` override as the config file.
pub fn default_catalog_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("APICLI_CONFIG_DIR") {
        let mut path = PathBuf::from(dir);
        path.push(DEFAULT_CATALOG_FILE_NAME);
        return Some(path);
    }

    let mut path = config_dir()?;
    path.push(DEFAULT_APPLICATION_ID);
    path.push(DEFAULT_CATALOG_FILE_NAME);
    Some(path)
}

/// Load a config file into a flat key → value map.
pub fn load(path: &PathBuf) -> Result<Map<String, Value>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound { path: path.clone() });
    }

    debug!("Loading configuration from {}...", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let value: Value = match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?,
        "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?,
        other => {
            return Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            })
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping { path: path.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"host": "example.com", "limit": 10}"#).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.get("host"), Some(&json!("example.com")));
        assert_eq!(config.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_load_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["config.yml", "config.yaml"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "host: example.com\nusername: jdoe\n").unwrap();

            let config = load(&path).unwrap();
            assert_eq!(config.get("host"), Some(&json!("example.com")));
            assert_eq!(config.get("username"), Some(&json!("jdoe")));
        }
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[section]\nhost=example.com\n").unwrap();

        match load(&path) {
            Err(ConfigError::UnsupportedFormat { extension }) => assert_eq!(extension, "ini"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(load(&path), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_rejects_non_mapping_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"["a", "b"]"#).unwrap();
        assert!(matches!(load(&path), Err(ConfigError::NotAMapping { .. })));
    }

    #[test]
    fn test_default_path_honors_env_override() {
        // Serialize access to the env var with a scoped set/remove.
        std::env::set_var("APICLI_CONFIG_DIR", "/tmp/apicli-test");
        let path = default_config_path().unwrap();
        std::env::remove_var("APICLI_CONFIG_DIR");

        assert_eq!(
            path,
            PathBuf::from("/tmp/apicli-test").join(DEFAULT_CONFIGURATION_FILE_NAME)
        );
    }
}
