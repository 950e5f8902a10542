//! Config hash stability.
//!
//! - Same inputs hash the same.
//! - Key order inside a document does not change the hash.
//! - Different values or layer order change the hash when the merged result differs.

use gfi_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
database:
  url_env: "GFI_DATABASE_URL"
  max_connections: 4
logging:
  filter: "info"
"#;

const BASE_YAML_REORDERED: &str = r#"
logging:
  filter: "info"
database:
  max_connections: 4
  url_env: "GFI_DATABASE_URL"
"#;

const OVERLAY_YAML: &str = r#"
logging:
  filter: "gfi_reconcile=debug,info"
"#;

#[test]
fn same_input_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.config_hash.len(), 64);
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn overlay_overrides_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged.config_json.pointer("/logging/filter").and_then(|v| v.as_str()),
        Some("gfi_reconcile=debug,info")
    );
    // Untouched siblings survive the deep merge.
    assert_eq!(
        merged.config_json.pointer("/database/max_connections").and_then(|v| v.as_u64()),
        Some(4)
    );
}

#[test]
fn layer_order_matters() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[OVERLAY_YAML, BASE_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn empty_layer_is_ignored() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, ""]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}
