//! Settings resolution.
//!
//! Secrets are looked up in the process environment first (after a best
//! effort `.env` load by the binaries), then in a flat YAML secrets file
//! standing in for the hosting platform's secret store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::utilities::errors::ConfigError;

/// Environment variable naming the secrets file.
pub const SECRETS_PATH_ENV: &str = "BLIND_DATE_SECRETS";
/// Secrets file used when [`SECRETS_PATH_ENV`] is unset.
pub const DEFAULT_SECRETS_PATH: &str = "secrets.yaml";

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gpt-4o";
pub const DEFAULT_PORT: u16 = 8080;

/// Two-level secret lookup: environment, then secrets file.
#[derive(Debug, Clone, Default)]
pub struct SecretSource {
    env: HashMap<String, String>,
    file: HashMap<String, String>,
}

impl SecretSource {
    /// Snapshot the process environment and the secrets file.
    ///
    /// A missing secrets file is not an error; an unreadable or malformed
    /// one is.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(SECRETS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_PATH));
        Ok(Self {
            env: std::env::vars().collect(),
            file: load_secrets_file(&path)?,
        })
    }

    /// Build a source from explicit maps.
    pub fn new(env: HashMap<String, String>, file: HashMap<String, String>) -> Self {
        Self { env, file }
    }

    /// Resolve `key`. A blank value in one layer falls through to the next.
    pub fn get(&self, key: &str) -> Option<String> {
        let non_blank = |layer: &HashMap<String, String>| {
            layer
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        non_blank(&self.env).or_else(|| non_blank(&self.file))
    }

    fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingSecret {
            key: key.to_string(),
        })
    }
}

/// Read a flat `KEY: value` YAML file. Non-string scalars are stringified.
pub fn load_secrets_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretsIo {
        path: display.clone(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let parsed: HashMap<String, serde_yaml::Value> =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::SecretsParse {
            path: display,
            source,
        })?;

    Ok(parsed
        .into_iter()
        .filter_map(|(k, v)| {
            let v = match v {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k, v))
        })
        .collect())
}

/// Connection details for the hosted store.
#[derive(Clone)]
pub struct StoreSettings {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Everything the services need at startup.
#[derive(Clone)]
pub struct Settings {
    /// Missing key puts the orchestrator in degraded mode.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub analysis_model: String,
    pub store: StoreSettings,
    /// Optional YAML corpus for the keyword retriever.
    pub retrieval_corpus: Option<PathBuf>,
    pub port: u16,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("chat_model", &self.chat_model)
            .field("analysis_model", &self.analysis_model)
            .field("store", &self.store)
            .field("retrieval_corpus", &self.retrieval_corpus)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    /// Load from the process environment and the secrets file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(&SecretSource::from_env()?)
    }

    /// Resolve settings from an explicit source.
    ///
    /// The store URL/key pair is mandatory; everything else has a default.
    pub fn from_source(source: &SecretSource) -> Result<Self, ConfigError> {
        let store = StoreSettings {
            url: source.require("SUPABASE_URL")?,
            key: source.require("SUPABASE_KEY")?,
        };

        let openai_api_key = source.get("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            log::warn!("OPENAI_API_KEY is not set; chat replies will report a missing key");
        }

        let port = match source.get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT".to_string(),
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: source.get("OPENAI_BASE_URL"),
            chat_model: source
                .get("CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            analysis_model: source
                .get("ANALYSIS_MODEL")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
            store,
            retrieval_corpus: source.get("RETRIEVAL_CORPUS").map(PathBuf::from),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_wins_over_secrets_file() {
        let source = SecretSource::new(
            map(&[("SUPABASE_URL", "https://env.example")]),
            map(&[("SUPABASE_URL", "https://file.example"), ("SUPABASE_KEY", "k")]),
        );
        let settings = Settings::from_source(&source).unwrap();
        assert_eq!(settings.store.url, "https://env.example");
        assert_eq!(settings.store.key, "k");
    }

    #[test]
    fn test_missing_store_secret_is_fatal() {
        let source = SecretSource::new(map(&[("SUPABASE_URL", "https://x")]), HashMap::new());
        let err = Settings::from_source(&source).unwrap_err();
        match err {
            ConfigError::MissingSecret { key } => assert_eq!(key, "SUPABASE_KEY"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_openai_key_is_not_fatal() {
        let source = SecretSource::new(
            map(&[("SUPABASE_URL", "https://x"), ("SUPABASE_KEY", "k")]),
            HashMap::new(),
        );
        let settings = Settings::from_source(&source).unwrap();
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.analysis_model, DEFAULT_ANALYSIS_MODEL);
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let source = SecretSource::new(
            map(&[("SUPABASE_URL", "  "), ("SUPABASE_KEY", "k")]),
            map(&[("SUPABASE_URL", "https://file.example")]),
        );
        let settings = Settings::from_source(&source).unwrap();
        assert_eq!(settings.store.url, "https://file.example");
    }

    #[test]
    fn test_empty_env_value_falls_back_to_secrets_file() {
        let source = SecretSource::new(
            map(&[("SUPABASE_URL", ""), ("SUPABASE_KEY", "k")]),
            map(&[("SUPABASE_URL", "https://file.example"), ("SUPABASE_KEY", "")]),
        );
        assert_eq!(source.get("SUPABASE_URL").as_deref(), Some("https://file.example"));
        assert_eq!(source.get("SUPABASE_KEY").as_deref(), Some("k"));

        let source = SecretSource::new(
            map(&[("SUPABASE_URL", "")]),
            map(&[("SUPABASE_URL", " ")]),
        );
        assert_eq!(source.get("SUPABASE_URL"), None);
    }

    #[test]
    fn test_invalid_port() {
        let source = SecretSource::new(
            map(&[("SUPABASE_URL", "u"), ("SUPABASE_KEY", "k"), ("PORT", "eighty")]),
            HashMap::new(),
        );
        assert!(matches!(
            Settings::from_source(&source),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_secrets_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SUPABASE_URL: https://file.example").unwrap();
        writeln!(file, "PORT: 9090").unwrap();
        writeln!(file, "nested:\n  a: 1").unwrap();

        let secrets = load_secrets_file(file.path()).unwrap();
        assert_eq!(secrets["SUPABASE_URL"], "https://file.example");
        assert_eq!(secrets["PORT"], "9090");
        assert!(!secrets.contains_key("nested"));
    }

    #[test]
    fn test_missing_secrets_file_is_empty() {
        let secrets = load_secrets_file(Path::new("/definitely/not/here.yaml")).unwrap();
        assert!(secrets.is_empty());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let source = SecretSource::new(
            map(&[
                ("SUPABASE_URL", "u"),
                ("SUPABASE_KEY", "super-secret"),
                ("OPENAI_API_KEY", "sk-secret"),
            ]),
            HashMap::new(),
        );
        let rendered = format!("{:?}", Settings::from_source(&source).unwrap());
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("sk-secret"));
    }
}
