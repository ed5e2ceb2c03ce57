use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the sectionbind library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("configuration is not initialized; supply a configuration tree first")]
    Uninitialized,

    #[error("no configuration registered for type {0}")]
    NotRegistered(&'static str),

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// A section that failed where the caller demanded a hard failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SectionError {
    section_path: String,
    environment: Option<String>,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl SectionError {
    pub fn new(
        section_path: impl Into<String>,
        environment: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            section_path: section_path.into(),
            environment,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn section_path(&self) -> &str {
        &self.section_path
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Every section that failed a batch validation.
#[derive(Debug, Error)]
#[error("Configuration validation failed:\n{}", render(.errors))]
pub struct AggregateError {
    errors: Vec<SectionError>,
}

impl AggregateError {
    pub fn new(errors: Vec<SectionError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[SectionError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<SectionError> {
        self.errors
    }
}

fn render(errors: &[SectionError]) -> String {
    errors
        .iter()
        .map(|e| format!("Section '{}': {}", e.section_path, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}
