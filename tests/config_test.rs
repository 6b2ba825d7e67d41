//! Integration tests for Settings layered loading.
//!
//! These tests run against temp project directories; a global config on the
//! host, if any, is merged underneath and only the keys set locally are asserted.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use dtree::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_loading_then_overrides_defaults() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        r#"
tree_file = "plans/launch.json"

[display]
precision = 4
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(project.path())).expect("load settings");

    assert_eq!(settings.tree_file, PathBuf::from("plans/launch.json"));
    assert_eq!(settings.display.precision, 4);
}

#[test]
fn given_tilde_in_local_tree_file_when_loading_then_expanded() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        "tree_file = \"~/trees/plan.json\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(project.path())).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.tree_file, PathBuf::from(home).join("trees/plan.json"));
}

#[test]
fn given_broken_local_config_when_loading_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "[display\nprecision = 1").unwrap();

    let err = Settings::load(Some(project.path())).unwrap_err();

    assert!(err.to_string().starts_with("config error"), "got {err}");
}

#[test]
fn given_template_when_parsing_then_is_valid_toml() {
    let template = Settings::template();
    let parsed: toml::Value = toml::from_str(&template).expect("template parses");
    assert!(parsed.get("display").is_some());
}
