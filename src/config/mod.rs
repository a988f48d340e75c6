//! Application configuration

pub mod file;
pub mod prompts;

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::providers::OpenAICompatConfig;

pub use file::{ConfigError, FileConfig, LlmConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Catalog file path or URL
    pub catalog_source: String,
    /// Directory holding the selection database
    pub data_dir: PathBuf,
    pub llm: LlmConfig,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup, reading the TOML file
    /// named by `PICKER_CONFIG` when set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match lookup("PICKER_CONFIG") {
            Some(path) => FileConfig::from_file(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let catalog_source = file
            .catalog
            .source
            .or_else(|| lookup("PICKER_CATALOG"))
            .unwrap_or_else(|| "products.json".into());

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            catalog_source,
            data_dir: lookup("PICKER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            api_key: lookup(&file.llm.api_key_env),
            llm: file.llm,
        })
    }

    /// Settings for the completion client
    pub fn completion_config(&self) -> OpenAICompatConfig {
        OpenAICompatConfig {
            base_url: self.llm.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            timeout_secs: self.llm.timeout_secs,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("picker.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.catalog_source, "products.json");
        assert_eq!(config.database_path(), PathBuf::from("./data/picker.db"));
        assert!(config.api_key.is_none());
        assert_eq!(config.completion_config().max_tokens, 400);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("PICKER_CATALOG", "/srv/products.json"),
            ("OPENAI_API_KEY", "sk-live"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.catalog_source, "/srv/products.json");
        assert_eq!(config.completion_config().api_key.as_deref(), Some("sk-live"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_config_file_takes_precedence_for_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picker.toml");
        std::fs::write(
            &path,
            "[llm]\napi_key_env = \"BEAUTY_KEY\"\n\n[catalog]\nsource = \"remote.json\"\n",
        )
        .unwrap();
        let path = path.to_string_lossy().to_string();

        let config = Config::from_lookup(lookup_from(&[
            ("PICKER_CONFIG", path.as_str()),
            ("PICKER_CATALOG", "ignored.json"),
            ("BEAUTY_KEY", "sk-file"),
        ]))
        .unwrap();

        assert_eq!(config.catalog_source, "remote.json");
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = Config::from_lookup(lookup_from(&[("PICKER_CONFIG", "/no/such/file.toml")]));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
