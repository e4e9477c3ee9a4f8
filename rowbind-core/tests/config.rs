use rowbind_core::config::{Config, ConfigError};
use serial_test::serial;
use std::fs;

#[test]
#[serial]
fn profile_file_overrides_base_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rowbind.yaml"),
        "rowbind:\n  sql:\n    dialect: sqlite\n  model:\n    instance_apart: true\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("rowbind-prod.yaml"),
        "rowbind:\n  sql:\n    dialect: postgres\n",
    )
    .unwrap();

    let config = Config::load_from(dir.path(), "prod").unwrap();
    assert_eq!(config.profile(), "prod");
    assert_eq!(config.get::<String>("rowbind.sql.dialect").unwrap(), "postgres");
    assert!(config.get::<bool>("rowbind.model.instance_apart").unwrap());
}

#[test]
#[serial]
fn environment_overrides_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rowbind.yaml"),
        "rowbind:\n  schema_cache:\n    ttl_secs: 10\n",
    )
    .unwrap();

    std::env::set_var("ROWBIND__SCHEMA_CACHE__TTL_SECS", "99");
    let config = Config::load_from(dir.path(), "dev");
    std::env::remove_var("ROWBIND__SCHEMA_CACHE__TTL_SECS");

    assert_eq!(config.unwrap().get::<u64>("rowbind.schema_cache.ttl_secs").unwrap(), 99);
}

#[test]
#[serial]
fn dotenv_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(".env"), "ROWBIND__LOG__FILTER=warn\n").unwrap();

    let config = Config::load_from(dir.path(), "dev");
    std::env::remove_var("ROWBIND__LOG__FILTER");

    assert_eq!(config.unwrap().get::<String>("rowbind.log.filter").unwrap(), "warn");
}

#[test]
#[serial]
fn missing_files_give_empty_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path(), "dev").unwrap();
    assert!(matches!(
        config.get::<String>("rowbind.database.url"),
        Err(ConfigError::NotFound(_))
    ));
}
