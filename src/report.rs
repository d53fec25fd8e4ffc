//! Report tree produced by validation.
//!
//! One report per document; API list envelopes get one child report per
//! entry. Reports carry structured issues so a presentation layer can
//! format, deduplicate and reorder them.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;

use crate::lint::LintResult;

/// One structural validation error, in compiler-neutral form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// JSON Pointer into the document where the violation occurred.
    #[serde(rename = "instancePath")]
    pub instance_path: String,
    /// Human-readable message.
    pub message: String,
    /// Which schema rule fired, as a pointer into the schema.
    #[serde(rename = "schemaPath", skip_serializing_if = "String::is_empty")]
    pub schema_path: String,
    /// Rule-specific detail, e.g. which property was missing.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// True for combinator failures (anyOf/oneOf), which a reporter should
    /// de-prioritize when more specific issues exist for the same path.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub choice: bool,
}

impl Issue {
    /// An issue carrying only a message, for load and resolution failures.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            instance_path: String::new(),
            message: message.into(),
            schema_path: String::new(),
            params: Map::new(),
            choice: false,
        }
    }

    /// An issue anchored at a specific instance path.
    pub fn at(instance_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_path: instance_path.into(),
            ..Self::message(message)
        }
    }

    /// Convert one error from the schema compiler.
    pub fn from_validation_error(error: &ValidationError<'_>) -> Self {
        let mut params = Map::new();
        let mut choice = false;
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                params.insert("missingProperty".to_string(), property.clone());
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                params.insert("additionalProperties".to_string(), json!(unexpected));
            }
            ValidationErrorKind::Enum { options } => {
                params.insert("allowedValues".to_string(), options.clone());
            }
            ValidationErrorKind::Format { format } => {
                params.insert("format".to_string(), json!(format));
            }
            ValidationErrorKind::AnyOf { .. }
            | ValidationErrorKind::OneOfNotValid { .. }
            | ValidationErrorKind::OneOfMultipleValid { .. } => {
                choice = true;
            }
            _ => {}
        }
        Self {
            instance_path: error.instance_path.to_string(),
            message: error.to_string(),
            schema_path: error.schema_path.to_string(),
            params,
            choice,
        }
    }

    /// Render the issue the way the CLI prints it: params expanded into the
    /// message, prefixed with the instance path when there is one.
    pub fn human_message(&self) -> String {
        let mut message = self.message.clone();
        if !self.params.is_empty() {
            let detail = self
                .params
                .iter()
                .map(|(key, value)| format!("{}: {}", spaced_label(key), plain_value(value)))
                .collect::<Vec<_>>()
                .join(", ");
            message = format!("{message} ({detail})");
        }
        if !self.instance_path.is_empty() {
            format!("{} {}", self.instance_path, message)
        } else if !self.schema_path.is_empty() {
            format!("{}, for schema {}", message, self.schema_path)
        } else {
            message
        }
    }
}

/// "missingProperty" -> "missing property"
fn spaced_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deduplicate identical issues and move combinator failures behind more
/// specific issues that share the same instance path. Input order is
/// otherwise preserved.
pub fn tidy_issues(issues: &mut Vec<Issue>) {
    let mut seen = std::collections::HashSet::new();
    issues.retain(|issue| seen.insert((issue.instance_path.clone(), issue.message.clone())));

    let mut first_index: HashMap<String, usize> = HashMap::new();
    for (index, issue) in issues.iter().enumerate() {
        first_index
            .entry(issue.instance_path.clone())
            .or_insert(index);
    }
    issues.sort_by_key(|issue| (first_index[&issue.instance_path], issue.choice));
}

/// Per-entry validation results, split by origin so each extension's
/// failures stay attributable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Results {
    /// Errors from the core schema (or from failing to load a document).
    pub core: Vec<Issue>,
    /// Errors per extension schema identifier, in declaration order.
    #[serde(serialize_with = "serialize_extensions")]
    pub extensions: Vec<(String, Vec<Issue>)>,
    /// Errors from the custom rule hook.
    pub custom: Vec<Issue>,
}

fn serialize_extensions<S>(
    entries: &[(String, Vec<Issue>)],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (schema, issues) in entries {
        map.serialize_entry(schema, issues)?;
    }
    map.end()
}

impl Results {
    /// Errors recorded for one extension identifier.
    pub fn extension_errors(&self, schema: &str) -> Option<&[Issue]> {
        self.extensions
            .iter()
            .find(|(key, _)| key == schema)
            .map(|(_, issues)| issues.as_slice())
    }

    pub fn has_errors(&self) -> bool {
        !self.core.is_empty()
            || !self.custom.is_empty()
            || self.extensions.iter().any(|(_, issues)| !issues.is_empty())
    }
}

/// Validation report for one document, possibly with children for API
/// list entries. Frozen once returned by the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub id: Option<String>,
    /// Declared `type` field, verbatim.
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    /// Declared `stac_version`, verbatim.
    pub version: Option<String>,
    /// `None` means skipped: excluded from pass/fail counts.
    pub valid: Option<bool>,
    pub skipped: bool,
    /// Skip reasons and classification notes.
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint: Option<LintResult>,
    pub results: Results,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Report>,
    #[serde(rename = "apiList")]
    pub api_list: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `id`, `type` and `stac_version` off the document. An id set
    /// earlier (e.g. a file path) is kept.
    pub(crate) fn describe(&mut self, data: &Value) {
        if self.id.is_none() {
            self.id = data.get("id").and_then(Value::as_str).map(str::to_string);
        }
        self.object_type = data.get("type").and_then(Value::as_str).map(str::to_string);
        self.version = data
            .get("stac_version")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    pub(crate) fn skip(&mut self, reason: impl Into<String>) {
        self.skipped = true;
        self.messages.push(reason.into());
    }

    /// Mark invalid with a core error.
    pub(crate) fn fail(&mut self, issue: Issue) {
        self.valid = Some(false);
        self.results.core.push(issue);
    }

    /// Parent validity is the AND over the children that were actually
    /// validated; skipped children are excluded.
    pub(crate) fn summarize_children(&mut self) {
        let mut any_judged = false;
        let mut all_valid = true;
        for child in &self.children {
            if let Some(valid) = child.valid {
                any_judged = true;
                all_valid &= valid;
            }
        }
        self.valid = any_judged.then_some(all_valid);
    }

    /// Counts for the presentation layer and the exit code.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        if self.children.is_empty() {
            summary.total = 1;
            summary.valid = usize::from(self.valid == Some(true));
            summary.invalid = usize::from(self.valid == Some(false));
            summary.skipped = usize::from(self.skipped);
            summary.malformed = self.lint.as_ref().map(|l| usize::from(!l.valid));
        } else {
            summary.total = self.children.len();
            for child in &self.children {
                match child.valid {
                    Some(true) => summary.valid += 1,
                    Some(false) => summary.invalid += 1,
                    None => {}
                }
                if child.skipped {
                    summary.skipped += 1;
                }
                if let Some(lint) = &child.lint {
                    *summary.malformed.get_or_insert(0) += usize::from(!lint.valid);
                }
            }
        }
        summary
    }
}

/// Aggregated counts over a report tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// `None` when no lint pass ran.
    pub malformed: Option<usize>,
    pub skipped: usize,
}
