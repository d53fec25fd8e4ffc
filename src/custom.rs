//! Custom rule hooks.
//!
//! A [`CustomValidator`] adds project-specific checks on top of schema
//! validation. Every method has a default no-op body, so implementors only
//! override what they need.

use jsonschema::ValidationOptions;
use serde_json::Value;

use crate::report::{Issue, Report};

/// Extra validation hooks, invoked by the orchestrator at fixed points.
pub trait CustomValidator: Send + Sync {
    /// Preprocess a document right after it was loaded. The returned value
    /// replaces the document for all later steps.
    fn after_loading(&self, data: Value, _report: &mut Report) -> Result<Value, String> {
        Ok(data)
    }

    /// Return a complete report to entirely replace schema validation for
    /// this entry, or `None` to proceed normally.
    fn bypass_validation(&self, _data: &Value, _report: &Report) -> Option<Report> {
        None
    }

    /// Run custom rules after schema validation. Collect failures through
    /// `assertions` to keep checking, or return `Err` to record exactly one
    /// error and stop.
    fn after_validation(
        &self,
        _data: &Value,
        _assertions: &mut Assertions,
        _report: &Report,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Customize the schema compiler, e.g. to register formats.
    fn configure_compiler(&self, options: ValidationOptions) -> ValidationOptions {
        options
    }
}

/// Collects assertion failures without aborting the remaining checks.
#[derive(Debug, Default)]
pub struct Assertions {
    errors: Vec<Issue>,
}

impl Assertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure unless `condition` holds.
    pub fn ok(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.errors.push(Issue::message(message));
        }
    }

    /// Record a failure unless both values are equal.
    pub fn equal<T: PartialEq + std::fmt::Debug>(
        &mut self,
        actual: T,
        expected: T,
        message: impl Into<String>,
    ) {
        if actual != expected {
            self.errors.push(Issue::message(format!(
                "{}: expected {:?}, got {:?}",
                message.into(),
                expected,
                actual
            )));
        }
    }

    /// Record an unconditional failure.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.errors.push(Issue::message(message));
    }

    /// Record a failure anchored at an instance path.
    pub fn fail_at(&mut self, instance_path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Issue::at(instance_path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<Issue> {
        self.errors
    }
}
