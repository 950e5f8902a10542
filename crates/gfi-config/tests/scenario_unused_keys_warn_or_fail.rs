use gfi_config::{
    load_layered_yaml, report_unused_keys, ImportSettings, UnusedKeyPolicy,
};
use std::io::Write;

const YAML: &str = r#"
database:
  host: "db.local"
  port: 5433
  max_connections: 6
  pool_timeout: 30
logging:
  filter: "debug"
unused_section:
  foo: 1
"#;

#[test]
fn warn_mode_reports_unused_keys_sorted() {
    let loaded = gfi_config::load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/database/pool_timeout".to_string(),
            "/unused_section/foo".to_string()
        ]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let loaded = gfi_config::load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn consumed_only_config_is_clean() {
    let yaml = "database:\n  url_env: MY_URL\nlogging:\n  filter: warn\n";
    let loaded = gfi_config::load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}

#[test]
fn layered_files_feed_typed_settings() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::File::create(&base)
        .unwrap()
        .write_all(YAML.as_bytes())
        .unwrap();
    std::fs::File::create(&local)
        .unwrap()
        .write_all(b"database:\n  schema: fleet\n")
        .unwrap();

    let loaded = load_layered_yaml(&[
        base.to_str().unwrap(),
        local.to_str().unwrap(),
    ])
    .unwrap();
    let s = ImportSettings::from_config_json(&loaded.config_json).unwrap();

    assert_eq!(s.database.host.as_deref(), Some("db.local"));
    assert_eq!(s.database.port, 5433);
    assert_eq!(s.database.max_connections, 6);
    assert_eq!(s.database.schema.as_deref(), Some("fleet"));
    assert_eq!(s.logging.filter, "debug");
}

#[test]
fn missing_file_is_an_error() {
    let err = load_layered_yaml(&["/nonexistent/gfi.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/gfi.yaml"));
}

#[test]
fn shipped_example_config_is_clean() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/gfi.example.yaml");
    let path = path.to_string_lossy().to_string();

    let loaded = load_layered_yaml(&[path.as_str()]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());

    let s = ImportSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(s.database.password_env.as_deref(), Some("GFI_DB_PASSWORD"));
    assert_eq!(s.database.max_connections, 4);
}
