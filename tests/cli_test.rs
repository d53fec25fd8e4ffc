//! CLI integration tests for the stac-validate binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stac-validate"))
}

/// Lay out a catalog core schema under `{dir}/schemas/`.
fn write_schemas(dir: &TempDir) -> PathBuf {
    let schema_dir = dir.path().join("schemas/catalog-spec/json-schema");
    std::fs::create_dir_all(&schema_dir).unwrap();
    std::fs::write(
        schema_dir.join("catalog.json"),
        serde_json::to_string(&json!({
            "type": "object",
            "required": ["type", "id", "description", "links"],
            "properties": {
                "type": { "const": "Catalog" },
                "id": { "type": "string" },
                "description": { "type": "string" },
                "links": { "type": "array" }
            }
        }))
        .unwrap(),
    )
    .unwrap();
    dir.path().join("schemas")
}

fn write_catalog(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": name.trim_end_matches(".json"),
            "description": "a catalog",
            "links": []
        }))
        .unwrap(),
    )
    .unwrap();
    path
}

#[test]
fn no_input_is_fatal() {
    cmd()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no path or URL specified"));
}

#[test]
fn schema_folder_must_be_a_directory() {
    let dir = TempDir::new().unwrap();
    let file = write_catalog(dir.path(), "catalog.json");

    cmd()
        .args([
            file.to_str().unwrap(),
            "--schemas",
            file.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not a valid directory"));
}

#[test]
fn valid_catalog_passes() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let catalog = write_catalog(dir.path(), "catalog.json");

    cmd()
        .args([
            catalog.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"))
        .stdout(predicate::str::contains("Valid: 1"));
}

#[test]
fn invalid_catalog_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "broken",
            "description": "missing links"
        }))
        .unwrap(),
    )
    .unwrap();

    cmd()
        .args([
            path.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("invalid"))
        .stdout(predicate::str::contains("required"))
        .stdout(predicate::str::contains("Invalid: 1"));
}

#[test]
fn directories_are_expanded() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    write_catalog(&data_dir, "one.json");
    write_catalog(&data_dir, "two.json");

    cmd()
        .args([
            data_dir.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2"))
        .stdout(predicate::str::contains("Valid: 2"));
}

#[test]
fn depth_zero_ignores_subdirectories() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let data_dir = dir.path().join("data");
    let nested = data_dir.join("nested");
    std::fs::create_dir_all(&nested).unwrap();
    write_catalog(&data_dir, "top.json");
    write_catalog(&nested, "below.json");

    cmd()
        .args([
            data_dir.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
            "--depth",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 1"));
}

#[test]
fn feature_collection_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("items.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "type": "FeatureCollection",
            "stac_version": "1.0.0"
        }))
        .unwrap(),
    )
    .unwrap();

    cmd()
        .args([path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped: 1"))
        .stdout(predicate::str::contains("Invalid: 0"));
}

#[test]
fn lint_reports_malformed_and_fails() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let path = dir.path().join("compact.json");
    std::fs::write(
        &path,
        serde_json::to_string(&json!({
            "type": "Catalog",
            "stac_version": "1.0.0",
            "id": "compact",
            "description": "d",
            "links": []
        }))
        .unwrap(),
    )
    .unwrap();

    cmd()
        .args([
            path.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
            "--lint",
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("malformed"))
        .stdout(predicate::str::contains("Malformed: 1"));
}

#[test]
fn format_rewrites_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let path = dir.path().join("compact.json");
    let value = json!({
        "type": "Catalog",
        "stac_version": "1.0.0",
        "id": "compact",
        "description": "d",
        "links": []
    });
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

    cmd()
        .args([
            path.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
            "--format",
        ])
        .assert()
        .success();

    let rewritten = std::fs::read_to_string(&path).unwrap();
    let mut expected = serde_json::to_string_pretty(&value).unwrap();
    expected.push('\n');
    assert_eq!(rewritten, expected);
}

#[test]
fn json_output_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let catalog = write_catalog(dir.path(), "catalog.json");

    let output = cmd()
        .args([
            catalog.to_str().unwrap(),
            "--schemas",
            schemas.to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["summary"]["total"], 1);
    assert_eq!(parsed["summary"]["valid"], 1);
    assert_eq!(parsed["reports"][0]["valid"], true);
}

#[test]
fn config_file_provides_defaults() {
    let dir = TempDir::new().unwrap();
    let schemas = write_schemas(&dir);
    let catalog = write_catalog(dir.path(), "catalog.json");
    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        serde_json::to_string(&json!({
            "files": [catalog.to_str().unwrap()],
            "schemas": schemas.to_str().unwrap()
        }))
        .unwrap(),
    )
    .unwrap();

    cmd()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid: 1"));
}

#[test]
fn missing_config_file_is_fatal() {
    cmd()
        .args(["--config", "/no/such/config.json", "whatever.json"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("config file"));
}
