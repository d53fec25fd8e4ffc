//! Validation orchestration.
//!
//! Drives classification, schema resolution, loading and validator
//! execution, and aggregates everything into a [`Report`] tree. Failures
//! below the fatal-config tier never escape an entry: they become report
//! data, and sibling entries are unaffected.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::classifier::{classify_payload, classify_type, Payload, TypeOutcome};
use crate::custom::Assertions;
use crate::lint::lint_file;
use crate::loader::{normalize_path, SchemaCache};
use crate::report::{Issue, Report};
use crate::resolver::{
    check_version, core_schema_url, extension_schema_url, is_http_url, VersionGate,
};
use crate::types::{ExtensionPolicy, Input, ValidationConfig, MIN_STAC_VERSION};

/// Validate a document, file path or URL.
///
/// A fresh schema cache is created for the call. Use
/// [`validate_with_cache`] to share compiled schemas across calls.
pub fn validate(input: impl Into<Input>, config: &ValidationConfig) -> Report {
    let mut cache = SchemaCache::new(config);
    validate_with_cache(input.into(), config, &mut cache)
}

/// Validate with a caller-owned schema cache.
pub fn validate_with_cache(
    input: Input,
    config: &ValidationConfig,
    cache: &mut SchemaCache,
) -> Report {
    let mut report = Report::new();

    let data = match input {
        Input::Path(path) => {
            report.id = Some(normalize_path(&path));
            if !is_http_url(&path) {
                report.lint = lint_file(Path::new(&path), config.lint);
            }
            match config.loader.load(&path) {
                Ok(data) => data,
                Err(error) => {
                    report.fail(Issue::message(error.to_string()));
                    return report;
                }
            }
        }
        Input::Value(data) => data,
    };

    // Top-level arrays are lists of documents (e.g. a pre-assembled batch)
    if let Value::Array(entries) = &data {
        report.api_list = true;
        return validate_entries(entries, report, config, cache);
    }

    match classify_payload(&data) {
        Payload::CollectionList(entries) => {
            info!(
                entries = entries.len(),
                "input is a /collections endpoint response; validating each collection"
            );
            report.describe(&data);
            report.api_list = true;
            validate_entries(entries, report, config, cache)
        }
        Payload::ItemList(entries) => {
            info!(
                entries = entries.len(),
                "input is an items endpoint response; validating each item"
            );
            report.describe(&data);
            report.api_list = true;
            validate_entries(entries, report, config, cache)
        }
        Payload::Single(_) => validate_entry(&data, report, config, cache),
    }
}

/// Validate each entry of an API list in order, isolating failures.
fn validate_entries(
    entries: &[Value],
    mut report: Report,
    config: &ValidationConfig,
    cache: &mut SchemaCache,
) -> Report {
    if entries.is_empty() {
        report.skip("The API list contains no entries");
        return report;
    }
    for entry in entries {
        let child = validate_entry(entry, Report::new(), config, cache);
        report.children.push(child);
    }
    report.summarize_children();
    report
}

/// Validate a single STAC object into the given report.
fn validate_entry(
    data: &Value,
    mut report: Report,
    config: &ValidationConfig,
    cache: &mut SchemaCache,
) -> Report {
    report.describe(data);

    // Custom preprocessing may replace the document
    let mut owned: Option<Value> = None;
    if let Some(custom) = &config.custom {
        match custom.after_loading(data.clone(), &mut report) {
            Ok(data) => owned = Some(data),
            Err(message) => {
                report.valid = Some(false);
                report.results.custom.push(Issue::message(message));
                return report;
            }
        }
        if let Some(bypass) = custom.bypass_validation(owned.as_ref().unwrap(), &report) {
            return bypass;
        }
    }
    let data = owned.as_ref().unwrap_or(data);

    // Version gate
    let Some(version) = data.get("stac_version").and_then(Value::as_str) else {
        report.skip("No STAC version found");
        return report;
    };
    match check_version(version) {
        VersionGate::Supported(_) => {}
        VersionGate::TooOld(_) => {
            report.skip(format!(
                "Can only validate STAC version >= {MIN_STAC_VERSION}"
            ));
            return report;
        }
        VersionGate::Unparsable => {
            report.skip(format!(
                "'{version}' is not a valid semantic version; cannot validate"
            ));
            return report;
        }
    }

    // Type gate
    let object_type = match classify_type(data) {
        TypeOutcome::Supported(object_type) => object_type,
        TypeOutcome::Unsupported => {
            report.skip("STAC ItemCollections are not supported yet");
            return report;
        }
        TypeOutcome::Unknown => {
            report.fail(Issue::at(
                "/type",
                "Can't detect type of the STAC object. Is the 'type' field missing or invalid?",
            ));
            return report;
        }
    };

    // Core schema
    let core_url = core_schema_url(object_type, version);
    debug!(schema = %core_url, "validating against core schema");
    report.results.core = run_schema(cache, &core_url, data);
    let core_failed = !report.results.core.is_empty();
    if core_failed {
        report.valid = Some(false);
    }

    // Extension schemas
    if core_failed && config.extension_policy == ExtensionPolicy::SkipOnCoreFailure {
        report
            .messages
            .push("Validation error in core schema, skipping extension validation".to_string());
    } else if let Some(extensions) = data.get("stac_extensions").and_then(Value::as_array) {
        for entry in extensions {
            let (key, errors) = validate_extension(entry, version, data, cache);
            if !errors.is_empty() {
                report.valid = Some(false);
            }
            report.results.extensions.push((key, errors));
        }
    }

    // Custom rules
    if let Some(custom) = &config.custom {
        let mut assertions = Assertions::new();
        report.results.custom = match custom.after_validation(data, &mut assertions, &report) {
            Ok(()) => assertions.into_errors(),
            Err(message) => vec![Issue::message(message)],
        };
        if !report.results.custom.is_empty() {
            report.valid = Some(false);
        }
    }

    if report.valid.is_none() {
        report.valid = Some(!report.results.has_errors());
    }
    report
}

/// Resolve and run one extension schema. Returns the identifier the errors
/// are attributed to and the errors themselves.
fn validate_extension(
    entry: &Value,
    version: &str,
    data: &Value,
    cache: &mut SchemaCache,
) -> (String, Vec<Issue>) {
    let Some(entry) = entry.as_str() else {
        return (
            entry.to_string(),
            vec![Issue::message(
                "'stac_extensions' entries must be strings containing a schema URL",
            )],
        );
    };
    match extension_schema_url(entry, version) {
        Ok(url) => {
            debug!(schema = %url, "validating against extension schema");
            let errors = run_schema(cache, &url, data);
            (url, errors)
        }
        Err(error) => (entry.to_string(), vec![Issue::message(error.to_string())]),
    }
}

/// Run one compiled schema against a document, collecting every error.
/// Load and compile failures become a single message issue.
fn run_schema(cache: &mut SchemaCache, url: &str, data: &Value) -> Vec<Issue> {
    match cache.validator(url) {
        Ok(validator) => validator
            .iter_errors(data)
            .map(|error| Issue::from_validation_error(&error))
            .collect(),
        Err(error) => vec![Issue::message(error.to_string())],
    }
}
