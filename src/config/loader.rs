//! Configuration loader with base/local merging.
//!
//! Loads a required base document and an optional local override, merges them
//! key-by-key and deserializes the result into a [`Config`].

use super::merge::{shallow_merge, strip_nulls};
use super::types::Config;
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default base configuration file name.
pub const BASE_CONFIG_FILE: &str = "config.json";

/// Default local override file name.
pub const LOCAL_CONFIG_FILE: &str = "config-local.json";

/// Which document a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Required, committed configuration.
    Base = 0,
    /// Optional developer override.
    Local = 1,
}

/// Paths of the two configuration documents.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub base: PathBuf,
    pub local: PathBuf,
}

impl ConfigPaths {
    /// Discover config paths relative to `root`.
    ///
    /// `THEME_PIPELINE_CONFIG` and `THEME_PIPELINE_LOCAL_CONFIG` override the default
    /// file names.
    pub fn discover(root: &Path) -> Self {
        let base = std::env::var("THEME_PIPELINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(BASE_CONFIG_FILE));
        let local = std::env::var("THEME_PIPELINE_LOCAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(LOCAL_CONFIG_FILE));

        Self {
            base: root.join(base),
            local: root.join(local),
        }
    }

    /// Create paths with explicit files.
    pub fn with_files(base: impl Into<PathBuf>, local: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            local: local.into(),
        }
    }

    fn path(&self, tier: ConfigTier) -> &Path {
        match tier {
            ConfigTier::Base => &self.base,
            ConfigTier::Local => &self.local,
        }
    }
}

/// Document syntax, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Load one configuration document.
///
/// - absent and `required`: [`ConfigError::MissingConfig`]
/// - absent and optional: an empty document
/// - blank content: [`ConfigError::EmptyConfig`]
/// - unparseable or not a mapping: [`ConfigError::InvalidConfig`]
pub fn load_document(path: &Path, required: bool) -> Result<Value, ConfigError> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), "Optional config not found, using empty document");
        return Ok(Value::Object(Map::new()));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ConfigError::EmptyConfig {
            path: path.to_path_buf(),
        });
    }

    let value = DocumentFormat::for_path(path)
        .parse(raw)
        .map_err(|message| ConfigError::invalid(path, message))?;

    if !value.is_object() {
        return Err(ConfigError::invalid(path, "expected a key-value document"));
    }

    Ok(value)
}

/// Loader holding the merged document and the typed configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    document: Value,
    config: Config,
    local_present: bool,
}

impl ConfigLoader {
    /// Load the base and local documents from `paths` and merge them.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self, ConfigError> {
        let base = load_document(paths.path(ConfigTier::Base), true)?;
        let local_present = paths.local.exists();
        let local = load_document(paths.path(ConfigTier::Local), false)?;

        let document = shallow_merge(base, local);
        let config: Config = serde_json::from_value(strip_nulls(document.clone()))
            .map_err(|e| ConfigError::invalid(&paths.base, e))?;
        config
            .validate()
            .map_err(|message| ConfigError::invalid(&paths.base, message))?;

        info!(
            base = %paths.base.display(),
            local = local_present,
            theme = %config.theme_name,
            targets = config.target_paths.len(),
            "Configuration loaded"
        );
        debug!(?config, "Effective configuration");

        Ok(Self {
            paths,
            document,
            config,
            local_present,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// The merged document before typing, as written by the user.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Whether a local override file was found.
    pub fn has_local(&self) -> bool {
        self.local_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths_in(temp: &TempDir) -> ConfigPaths {
        ConfigPaths::with_files(
            temp.path().join(BASE_CONFIG_FILE),
            temp.path().join(LOCAL_CONFIG_FILE),
        )
    }

    #[test]
    fn test_required_missing_fails() {
        let temp = TempDir::new().unwrap();
        let err = load_document(&temp.path().join("config.json"), true).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfig { .. }));
    }

    #[test]
    fn test_optional_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        let value = load_document(&temp.path().join("config-local.json"), false).unwrap();
        assert_eq!(value, Value::Object(Map::new()));
    }

    #[test]
    fn test_blank_file_is_empty_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config-local.json");
        std::fs::write(&path, "  \n\t\n").unwrap();

        for required in [true, false] {
            let err = load_document(&path, required).unwrap_err();
            assert!(matches!(err, ConfigError::EmptyConfig { .. }));
        }
    }

    #[test]
    fn test_malformed_file_is_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{\"themeName\": ").unwrap();

        let err = load_document(&path, true).unwrap_err();
        match err {
            ConfigError::InvalidConfig { message, .. } => assert!(!message.is_empty()),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_non_mapping_is_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = load_document(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { .. }));
    }

    #[test]
    fn test_yaml_documents_by_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "themeName: Acme\ntargetPaths:\n  - /sites/a\n").unwrap();

        let value = load_document(&path, true).unwrap();
        assert_eq!(value["themeName"], "Acme");
        assert_eq!(value["targetPaths"][0], "/sites/a");
    }

    #[test]
    fn test_local_overrides_base() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(
            &paths.base,
            r#"{"themeName": "Acme", "distFolder": "_out", "jsFiles": ["base/*.js"]}"#,
        )
        .unwrap();
        std::fs::write(&paths.local, r#"{"jsFiles": ["local/*.js"]}"#).unwrap();

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert!(loader.has_local());
        let config = loader.config();
        assert_eq!(config.theme_name, "Acme");
        assert_eq!(config.dist_folder, PathBuf::from("_out"));
        assert_eq!(config.js_files, vec!["local/*.js".to_string()]);
    }

    #[test]
    fn test_malformed_local_is_fatal() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(&paths.base, r#"{"themeName": "Acme"}"#).unwrap();
        std::fs::write(&paths.local, "not json").unwrap();

        let err = ConfigLoader::load_with_paths(paths).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { .. }));
    }

    #[test]
    fn test_missing_theme_name_is_invalid() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(&paths.base, r#"{"targetPaths": []}"#).unwrap();

        let err = ConfigLoader::load_with_paths(paths).unwrap_err();
        match err {
            ConfigError::InvalidConfig { message, .. } => assert!(message.contains("themeName")),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_local_null_keeps_base_value() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(
            &paths.base,
            r#"{"themeName": "Acme", "distFolder": "_out", "jsFiles": ["base/*.js"]}"#,
        )
        .unwrap();
        std::fs::write(&paths.local, r#"{"distFolder": null, "jsFiles": null}"#).unwrap();

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().dist_folder, PathBuf::from("_out"));
        assert_eq!(loader.config().js_files, vec!["base/*.js".to_string()]);
        assert_eq!(loader.document()["distFolder"], "_out");
    }

    #[test]
    fn test_null_everywhere_falls_back_to_default() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(&paths.base, r#"{"themeName": "Acme", "distFolder": null}"#).unwrap();
        std::fs::write(&paths.local, r#"{"distFolder": null}"#).unwrap();

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().dist_folder, PathBuf::from("dist"));
    }
}
