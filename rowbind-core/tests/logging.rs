use rowbind_core::logging::{init_from_config, init_tracing};
use rowbind_core::Config;

#[test]
fn second_initialisation_is_harmless() {
    let config = Config::from_yaml_str("rowbind:\n  log:\n    filter: \"warn\"\n", "test").unwrap();
    assert!(init_from_config(&config));
    assert!(!init_tracing(None));
    tracing::info!("still logging after a second init");
}
