//! Core types and configuration for STAC validation.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::custom::CustomValidator;
use crate::loader::{DefaultLoader, DocumentLoader};

/// Host prefix all canonical core-schema identifiers start with.
pub const SCHEMA_HOST: &str = "https://schemas.stacspec.org";

/// Lowest STAC version this crate can validate.
pub const MIN_STAC_VERSION: &str = "1.0.0-rc.1";

/// The STAC object types that have a core schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Catalog,
    Collection,
    Item,
}

impl ObjectType {
    /// Schema name used in the canonical URL template.
    ///
    /// `type: "Feature"` maps to the `item` schema, not `feature`.
    pub fn schema_name(&self) -> &'static str {
        match self {
            ObjectType::Catalog => "catalog",
            ObjectType::Collection => "collection",
            ObjectType::Item => "item",
        }
    }

    /// Parse the `type` field value of a STAC object.
    pub fn from_type_field(value: &str) -> Option<Self> {
        match value {
            "Catalog" => Some(ObjectType::Catalog),
            "Collection" => Some(ObjectType::Collection),
            "Feature" => Some(ObjectType::Item),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema_name())
    }
}

/// What to validate: an already-parsed JSON value, or a path/URL to load.
#[derive(Debug, Clone)]
pub enum Input {
    /// A local file path or an HTTP(S) URL.
    Path(String),
    /// Already-parsed JSON.
    Value(Value),
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<&str> for Input {
    fn from(path: &str) -> Self {
        Input::Path(path.to_string())
    }
}

impl From<String> for Input {
    fn from(path: String) -> Self {
        Input::Path(path)
    }
}

/// Whether extension schemas are still checked after the core schema failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionPolicy {
    /// Check every declared extension regardless of the core outcome.
    #[default]
    Always,
    /// Stop after a core failure; extension results stay empty.
    SkipOnCoreFailure,
}

/// Lint behavior for local files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintMode {
    /// No lint pass.
    #[default]
    Off,
    /// Report malformed files without touching them.
    Check,
    /// Rewrite malformed files in canonical form.
    Fix,
}

/// Configuration for a validation run.
///
/// The same config must stay active for a whole run: the schema map and
/// folder feed the loader cache, which is keyed for the run's lifetime.
#[derive(Clone)]
pub struct ValidationConfig {
    /// Local folder standing in for the `https://schemas.stacspec.org/v{x}`
    /// prefix of core schema identifiers.
    pub schema_folder: Option<PathBuf>,
    /// Identifier-prefix to local-path overrides, checked in declaration
    /// order; the first matching prefix wins.
    pub schema_map: Vec<(String, PathBuf)>,
    /// Extension checking after a core failure.
    pub extension_policy: ExtensionPolicy,
    /// Lint pass for local file inputs.
    pub lint: LintMode,
    /// Loads documents and schemas by path or URL.
    pub loader: Arc<dyn DocumentLoader>,
    /// Optional custom rule hooks.
    pub custom: Option<Arc<dyn CustomValidator>>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            schema_folder: None,
            schema_map: Vec::new(),
            extension_policy: ExtensionPolicy::default(),
            lint: LintMode::default(),
            loader: Arc::new(DefaultLoader),
            custom: None,
        }
    }
}

impl std::fmt::Debug for ValidationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationConfig")
            .field("schema_folder", &self.schema_folder)
            .field("schema_map", &self.schema_map)
            .field("extension_policy", &self.extension_policy)
            .field("lint", &self.lint)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate against core schemas in a local folder instead of fetching
    /// them from the canonical host.
    pub fn schema_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.schema_folder = Some(folder.into());
        self
    }

    /// Redirect a schema identifier prefix to a local path.
    pub fn map_schema(mut self, prefix: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.schema_map.push((prefix.into(), path.into()));
        self
    }

    pub fn extension_policy(mut self, policy: ExtensionPolicy) -> Self {
        self.extension_policy = policy;
        self
    }

    pub fn lint(mut self, mode: LintMode) -> Self {
        self.lint = mode;
        self
    }

    /// Replace the default filesystem/HTTP loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn custom_validator(mut self, custom: Arc<dyn CustomValidator>) -> Self {
        self.custom = Some(custom);
        self
    }
}
