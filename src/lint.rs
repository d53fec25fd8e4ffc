//! JSON well-formedness linting for local files.
//!
//! A file is well-formed when it matches its own 2-space pretty-printed
//! serialization, modulo newline normalization. `Fix` mode rewrites the
//! file in canonical form. Remote inputs are never linted.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::types::LintMode;

/// Outcome of the lint pass for one local file.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    /// True when the file already was in canonical form.
    pub valid: bool,
    /// True when `Fix` mode rewrote the file.
    pub fixed: bool,
    /// Read/parse/write failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// First point of divergence, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Lint a local file. Returns `None` when `mode` is `Off`.
pub fn lint_file(path: &Path, mode: LintMode) -> Option<LintResult> {
    if mode == LintMode::Off {
        return None;
    }

    let mut result = LintResult {
        valid: false,
        fixed: false,
        error: None,
        diff: None,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            result.error = Some(error.to_string());
            return Some(result);
        }
    };
    let parsed: Value = match serde_json::from_str(&content) {
        Ok(parsed) => parsed,
        Err(error) => {
            result.error = Some(error.to_string());
            return Some(result);
        }
    };

    // serde_json pretty-prints with 2-space indentation
    let expected = match serde_json::to_string_pretty(&parsed) {
        Ok(expected) => expected,
        Err(error) => {
            result.error = Some(error.to_string());
            return Some(result);
        }
    };

    let given = normalize_newlines(&content);
    let canonical = normalize_newlines(&expected);
    result.valid = given == canonical;

    if !result.valid {
        result.diff = first_divergence(&given, &canonical);
        if mode == LintMode::Fix {
            match std::fs::write(path, &canonical) {
                Ok(()) => result.fixed = true,
                Err(error) => result.error = Some(error.to_string()),
            }
        }
    }

    Some(result)
}

/// *nix newlines, one newline at end of file.
fn normalize_newlines(s: &str) -> String {
    let mut out = s.replace("\r\n", "\n").replace('\r', "\n");
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// Describe the first line where the two renderings differ.
fn first_divergence(given: &str, expected: &str) -> Option<String> {
    for (number, (g, e)) in given.lines().zip(expected.lines()).enumerate() {
        if g != e {
            return Some(format!(
                "line {}: expected {:?}, found {:?}",
                number + 1,
                e,
                g
            ));
        }
    }
    let given_lines = given.lines().count();
    let expected_lines = expected.lines().count();
    (given_lines != expected_lines).then(|| {
        format!(
            "expected {} lines, found {}",
            expected_lines, given_lines
        )
    })
}
