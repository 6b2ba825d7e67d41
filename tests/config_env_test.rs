//! Environment overrides for Settings.
//!
//! Kept in its own test binary: it mutates process-wide `DTREE_*` variables,
//! which would leak into the file-based config tests running in parallel.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use dtree::config::{local_config_path, Settings};

#[test]
fn given_dtree_env_vars_when_loading_then_override_local_config() {
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        r#"
tree_file = "local.json"

[display]
precision = 4
show_ids = true
"#,
    )
    .unwrap();
    let env_tree = project.path().join("from_env.json");

    std::env::set_var("DTREE_TREE_FILE", &env_tree);
    std::env::set_var("DTREE_DISPLAY__PRECISION", "5");
    std::env::set_var("DTREE_DISPLAY__SHOW_IDS", "false");
    let loaded = Settings::load(Some(project.path()));
    std::env::remove_var("DTREE_TREE_FILE");
    std::env::remove_var("DTREE_DISPLAY__PRECISION");
    std::env::remove_var("DTREE_DISPLAY__SHOW_IDS");

    let settings = loaded.expect("load settings");
    assert_eq!(settings.tree_file, PathBuf::from(&env_tree));
    assert_eq!(settings.display.precision, 5);
    assert!(!settings.display.show_ids);
}
