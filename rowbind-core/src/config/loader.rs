use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Prefix of environment variables overlaid on the file configuration.
pub(crate) const ENV_PREFIX: &str = "ROWBIND__";

/// Load and parse a YAML file if it exists, flattening it into `values`.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
        source_name: path.display().to_string(),
        message: e.to_string(),
    })?;
    load_yaml(&content, &path.display().to_string(), values)
}

pub(crate) fn load_yaml(
    content: &str,
    source_name: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| ConfigError::Load {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys.
pub(crate) fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, ConfigValue>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key_str = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let full_key = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}

/// Map `ROWBIND__MODEL__INSTANCE_APART` to `rowbind.model.instance_apart`.
///
/// `__` separates segments so that single underscores survive inside keys.
pub(crate) fn env_key_to_config_key(env_key: &str) -> Option<String> {
    let rest = env_key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    let segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
    Some(format!("rowbind.{}", segments.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_keep_single_underscores() {
        assert_eq!(
            env_key_to_config_key("ROWBIND__SCHEMA_CACHE__TTL_SECS").as_deref(),
            Some("rowbind.schema_cache.ttl_secs")
        );
        assert_eq!(env_key_to_config_key("PATH"), None);
        assert_eq!(env_key_to_config_key("ROWBIND__"), None);
    }

    #[test]
    fn nested_mappings_flatten() {
        let mut values = HashMap::new();
        load_yaml("rowbind:\n  sql:\n    dialect: postgres\n", "inline", &mut values).unwrap();
        assert_eq!(
            values.get("rowbind.sql.dialect"),
            Some(&ConfigValue::String("postgres".into()))
        );
    }
}
