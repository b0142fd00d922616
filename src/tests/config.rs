use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use crate::config::Config;
use crate::sql::DateOverride;

fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn config_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("searchq.yaml")
}

#[test]
fn test_missing_file_is_default() {
    let dir = temp_dir();
    let config = Config::load_with(&config_path(&dir)).unwrap();
    assert_eq!(config, Config::default());
    assert!(!config_path(&dir).exists());
}

#[test]
fn test_load_both_policies() {
    let dir = temp_dir();
    let path = config_path(&dir);
    std::fs::write(
        &path,
        r#"
document:
  any: [front, back, tag]
  isString: [front, back]
  isDate: [nextReview]
relational:
  anyOf: [name, name, body]
dateOverride: defaultOperatorOnly
"#,
    )
    .unwrap();

    let config = Config::load_with(&path).unwrap();
    assert_eq!(config.document.any().unwrap().len(), 3);
    assert!(!config.document.is_string_field("tag"));
    assert!(config.document.is_date_field("nextReview"));
    // duplicates dropped, order kept
    assert_eq!(
        config.relational.any().unwrap(),
        &["name".to_string(), "body".to_string()][..]
    );
    assert_eq!(config.relational.is_string(), None);
    assert_eq!(config.date_override, DateOverride::DefaultOperatorOnly);
}

#[test]
fn test_malformed_config_fails() {
    let dir = temp_dir();
    let path = config_path(&dir);
    std::fs::write(&path, "document: 42").unwrap();
    assert!(Config::load_with(&path).is_err());
}

#[test]
fn test_empty_field_name_rejected() {
    let err = Config::from_yaml("relational:\n  isDate: ['']\n").unwrap_err();
    assert!(err.to_string().contains("relational.isDate"));
}

#[test]
fn test_save_and_reload() {
    let dir = temp_dir();
    let path = config_path(&dir);
    let config = Config::from_yaml("document:\n  isString: []\ndateOverride: always\n").unwrap();
    config.save(&path).unwrap();

    let reloaded = Config::load_with(&path).unwrap();
    assert_eq!(reloaded, config);
    // present-but-empty survives the round trip
    assert_eq!(reloaded.document.is_string(), Some(&[][..]));
}

#[test]
fn test_config_builds_engines() {
    let config = Config::from_yaml(
        "relational:\n  anyOf: [name]\n  isDate: [created]\ndateOverride: defaultOperatorOnly\n",
    )
    .unwrap();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let query = config.sql_search().search_at(Some("created>-1d"), now).unwrap();
    assert!(query.text.starts_with("created > @"));

    let filter = config.document_search().search("created:x").unwrap();
    assert_eq!(filter.to_json(), serde_json::json!({"created": {"$regex": "x"}}));
}
