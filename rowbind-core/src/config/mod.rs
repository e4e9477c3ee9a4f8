mod loader;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use value::{ConfigValue, FromConfigValue};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    #[error("Config key not found: {0}")]
    NotFound(String),
    /// The value could not be converted to the requested type.
    #[error("Config type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading a config source.
    #[error("Config load error in {source_name}: {message}")]
    Load { source_name: String, message: String },
    /// A value was readable but outside of what the key accepts.
    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

/// Configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `rowbind.yaml` (base)
/// 2. `rowbind-{profile}.yaml` (profile override)
/// 3. `.env`, then `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. Environment variables: `ROWBIND__SQL__DIALECT` overrides `rowbind.sql.dialect`
///
/// Profile is determined by: `ROWBIND_PROFILE` env var > argument.
#[derive(Debug, Clone)]
pub struct Config {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl Config {
    /// Load configuration from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration, looking for the YAML and `.env` files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile = std::env::var("ROWBIND_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("rowbind.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("rowbind-{active_profile}.yaml")), &mut values)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        for (env_key, env_val) in std::env::vars() {
            if let Some(key) = loader::env_key_to_config_key(&env_key) {
                values.insert(key, ConfigValue::String(env_val));
            }
        }

        tracing::debug!(profile = %active_profile, keys = values.len(), "configuration loaded");

        Ok(Config {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml(yaml, "inline yaml", &mut values)?;
        Ok(Config {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        Config {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, falling back to `default` only when the key is
    /// missing. A present but malformed value is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.get(key) {
            Err(ConfigError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads() {
        let config = Config::from_yaml_str(
            r#"
rowbind:
  database:
    url: "sqlite::memory:"
    max_connections: 4
  model:
    instance_apart: false
"#,
            "test",
        )
        .unwrap();
        assert_eq!(config.get::<String>("rowbind.database.url").unwrap(), "sqlite::memory:");
        assert_eq!(config.get::<u32>("rowbind.database.max_connections").unwrap(), 4);
        assert!(!config.get::<bool>("rowbind.model.instance_apart").unwrap());
    }

    #[test]
    fn get_or_only_defaults_missing_keys() {
        let mut config = Config::empty();
        assert_eq!(config.get_or("rowbind.schema_cache.ttl_secs", 30u64).unwrap(), 30);
        config.set("rowbind.schema_cache.ttl_secs", ConfigValue::String("soon".into()));
        assert!(matches!(
            config.get_or("rowbind.schema_cache.ttl_secs", 30u64),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_load_error() {
        let err = Config::from_yaml_str("rowbind: [unclosed", "test").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
