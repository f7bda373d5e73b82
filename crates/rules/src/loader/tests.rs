//! Tests for the campaign loader module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::Campaign;

const WELCOME_YAML: &str = r#"
apiVersion: v1
kind: Drip
metadata:
  name: welcome
  enabled: true
spec:
  subject_template: "Welcome {{ user.email }}"
  body_template: "<p>Glad you're here</p>"
  rules:
    - field: joined_at
      lookup: gte
      value: now-1 day
"#;

fn temp_loader() -> (TempDir, CampaignLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = CampaignLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

fn loaded_names(results: &[LoadResult]) -> Vec<&str> {
    results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { name } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn load_campaign_from_file() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("welcome.yml");
    fs::write(&path, WELCOME_YAML).unwrap();

    let campaign = loader.load_file(&path).unwrap();
    assert_eq!(campaign.name(), "welcome");
    assert!(campaign.enabled());
    assert_eq!(campaign.rules().len(), 1);
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("welcome.yml"), WELCOME_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), WELCOME_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a campaign").unwrap();

    let results = loader.load_all().unwrap();

    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!(loaded_names(&results), vec!["welcome"]);
    assert_eq!(skipped, 2);
    assert!(loader.get("welcome").is_some());
}

#[test]
fn load_all_recursive_subdirectories() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("welcome.yml"), WELCOME_YAML).unwrap();

    let sub = dir.path().join("winback");
    fs::create_dir(&sub).unwrap();
    let yaml = WELCOME_YAML
        .replace("name: welcome", "name: come-back")
        .replace("enabled: true", "enabled: false");
    fs::write(sub.join("come-back.yaml"), yaml).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_names(&results).len(), 2);

    let names: Vec<String> = loader.all().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["come-back", "welcome"]);
    let enabled: Vec<String> = loader
        .enabled()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(enabled, vec!["welcome"]);
}

#[test]
fn duplicate_names_are_rejected() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), WELCOME_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), WELCOME_YAML).unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(loaded_names(&results), vec!["welcome"]);
    match &results[1].status {
        LoadStatus::Failed { error } => assert!(error.contains("Duplicate campaign name")),
        other => panic!("expected failure, got {other:?}"),
    }

    // rescanning the same files keeps the first source
    let again = loader.load_all().unwrap();
    assert!(again[0].is_loaded());
    assert!(again[1].is_failed());
}

#[test]
fn wrong_kind_and_bad_yaml_fail() {
    let (dir, loader) = temp_loader();
    fs::write(
        dir.path().join("other.yml"),
        WELCOME_YAML.replace("kind: Drip", "kind: Newsletter"),
    )
    .unwrap();
    fs::write(dir.path().join("broken.yml"), "metadata: [").unwrap();

    let results = loader.load_all().unwrap();
    assert!(results.iter().all(LoadResult::is_failed));
    assert!(loader.all().is_empty());
}

#[test]
fn get_and_enabled_views() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("welcome.yml"), WELCOME_YAML).unwrap();
    let paused = Campaign::new("paused", "Hi", "There");
    fs::write(
        dir.path().join("paused.yml"),
        serde_yaml::to_string(&paused).unwrap(),
    )
    .unwrap();

    loader.load_all().unwrap();
    assert_eq!(loader.get("paused"), Some(paused));
    assert!(loader.get("missing").is_none());
    let enabled: Vec<String> = loader.enabled().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(loader.all().len(), 2);
    assert_eq!(enabled.len(), 1);
}
