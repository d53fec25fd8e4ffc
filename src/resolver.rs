//! Schema identifier resolution.
//!
//! Pure string computation: turns a document's declared type, version and
//! extension entries into canonical schema URLs. No I/O happens here.

use semver::Version;

use crate::error::SchemaError;
use crate::types::{ObjectType, MIN_STAC_VERSION, SCHEMA_HOST};

/// Extension shortcuts that were valid in historic STAC versions. Only used
/// to phrase better diagnostics; shortcuts are rejected either way.
pub const KNOWN_SHORTCUTS: &[&str] = &[
    "card4l-eo",
    "card4l-sar",
    "checksum",
    "collection-assets",
    "datacube",
    "eo",
    "file",
    "item-assets",
    "label",
    "pointcloud",
    "processing",
    "projection",
    "sar",
    "sat",
    "scientific",
    "single-file-stac",
    "tiled-assets",
    "timestamps",
    "version",
    "view",
];

/// How a declared `stac_version` gates validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionGate {
    /// Version is supported; carries the parsed version.
    Supported(Version),
    /// Version parses but is below the minimum supported.
    TooOld(Version),
    /// Not a semantic version.
    Unparsable,
}

/// Check a `stac_version` string against the minimum supported version,
/// using full semver precedence (`1.0.0-rc.1` orders before `1.0.0`).
pub fn check_version(stac_version: &str) -> VersionGate {
    let Ok(version) = Version::parse(stac_version) else {
        return VersionGate::Unparsable;
    };
    // MIN_STAC_VERSION is a valid semver literal
    let minimum = Version::parse(MIN_STAC_VERSION).unwrap();
    if version < minimum {
        VersionGate::TooOld(version)
    } else {
        VersionGate::Supported(version)
    }
}

/// Canonical core-schema URL for an object type and STAC version.
pub fn core_schema_url(object_type: ObjectType, stac_version: &str) -> String {
    let name = object_type.schema_name();
    format!("{SCHEMA_HOST}/v{stac_version}/{name}-spec/json-schema/{name}.json")
}

/// Resolve one `stac_extensions` entry to a schema URL.
///
/// Absolute HTTP(S) URLs pass through unchanged. Bare shortcut names are
/// rejected, except for the handful that 1.0.0-rc.1 still allowed, which
/// are rewritten to their known URL form.
pub fn extension_schema_url(entry: &str, stac_version: &str) -> Result<String, SchemaError> {
    if let Some(url) = expand_rc1_shortcut(entry, stac_version) {
        return Ok(url);
    }
    if is_http_url(entry) {
        return Ok(entry.to_string());
    }
    if entry == "proj" {
        // A very common mistake; give a pointed explanation.
        return Err(SchemaError::ProjShortcut);
    }
    Err(SchemaError::Shortcut {
        entry: entry.to_string(),
    })
}

/// Historical compatibility shim for exactly STAC 1.0.0-rc.1, which still
/// accepted four bare extension names. Delete once rc.1 support is dropped.
fn expand_rc1_shortcut(entry: &str, stac_version: &str) -> Option<String> {
    if stac_version != "1.0.0-rc.1" {
        return None;
    }
    match entry {
        "eo" | "projection" | "scientific" | "view" => Some(format!(
            "{SCHEMA_HOST}/v1.0.0-rc.1/extensions/{entry}/json-schema/schema.json"
        )),
        _ => None,
    }
}

/// True for absolute `http://` or `https://` identifiers.
pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
