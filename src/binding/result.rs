use std::fmt;

use crate::error::SectionError;

/// One violated rule, or a not-found / binding diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    field: Option<String>,
    message: String,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Dotted path of the offending field, when the failure concerns one.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome<T> {
    Bound(T),
    Rejected(Vec<ValidationFailure>),
}

/// Outcome of binding and validating one section.
///
/// Either holds the bound value or a non-empty list of failures, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigResult<T> {
    section_path: String,
    environment: Option<String>,
    outcome: Outcome<T>,
}

impl<T> ConfigResult<T> {
    pub(crate) fn success(value: T, section_path: &str, environment: Option<String>) -> Self {
        Self {
            section_path: section_path.to_string(),
            environment,
            outcome: Outcome::Bound(value),
        }
    }

    /// `failures` must be non-empty; an empty list is replaced by a generic
    /// failure so the result still reports invalid.
    pub(crate) fn failure(
        mut failures: Vec<ValidationFailure>,
        section_path: &str,
        environment: Option<String>,
    ) -> Self {
        if failures.is_empty() {
            failures.push(ValidationFailure::new(format!(
                "Configuration section '{section_path}' is invalid"
            )));
        }
        Self {
            section_path: section_path.to_string(),
            environment,
            outcome: Outcome::Rejected(failures),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, Outcome::Bound(_))
    }

    /// The requested section path, without any environment suffix.
    pub fn section_path(&self) -> &str {
        &self.section_path
    }

    /// The environment whose overlay section was read, `None` when the base
    /// section was used.
    ///
    /// A successful overlay bind keeps the environment here rather than
    /// clearing it. Callers that expect `None` on every success should
    /// compare against the environment they requested instead.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn value(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Bound(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self.outcome {
            Outcome::Bound(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    /// Failures in the order they were reported; empty on success.
    pub fn errors(&self) -> &[ValidationFailure] {
        match &self.outcome {
            Outcome::Bound(_) => &[],
            Outcome::Rejected(failures) => failures,
        }
    }

    /// All failure messages joined with `", "`.
    pub fn error_summary(&self) -> String {
        self.errors()
            .iter()
            .map(ValidationFailure::message)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Converts an invalid result into a [`SectionError`].
    pub fn into_result(self) -> Result<T, SectionError> {
        let summary = self.error_summary();
        match self.outcome {
            Outcome::Bound(value) => Ok(value),
            Outcome::Rejected(_) => Err(SectionError::new(
                self.section_path,
                self.environment,
                format!("Configuration validation failed: {summary}"),
            )),
        }
    }
}
