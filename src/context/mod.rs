//! The configuration context every bind call goes through.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::binding::{self, BindOptions, BindTarget, ConfigResult, SectionSet};
use crate::config::ConfigTree;
use crate::error::SectionError;
use crate::Error;

/// Holds the configuration tree and the default [`BindOptions`].
///
/// Built once at startup and shared by reference (or `Arc`) afterwards; it is
/// immutable, so concurrent reads need no locking.
///
/// ## Example
///
/// ```no_run
/// use sectionbind::{Config, ConfigContext};
/// use serde::{Deserialize, Serialize};
/// use validator::Validate;
///
/// #[derive(Debug, Default, Serialize, Deserialize, Validate)]
/// struct DatabaseSettings {
///     #[validate(length(min = 1))]
///     connection_string: String,
///     #[validate(range(min = 1, max = 3600))]
///     command_timeout_seconds: u32,
/// }
///
/// let context = ConfigContext::builder()
///     .with_tree(Config::builder().with_file("appsettings.toml", true).build()?)
///     .build()?;
///
/// let result = context.get_for_environment::<DatabaseSettings>("Database", "Production", None);
/// if let Some(settings) = result.value() {
///     println!("timeout: {}", settings.command_timeout_seconds);
/// }
/// # Ok::<(), sectionbind::Error>(())
/// ```
#[derive(Debug)]
pub struct ConfigContext {
    tree: ConfigTree,
    options: BindOptions,
}

impl ConfigContext {
    /// Creates a context with default options.
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            tree,
            options: BindOptions::default(),
        }
    }

    /// Creates a new builder for constructing a `ConfigContext`.
    pub fn builder() -> ConfigContextBuilder {
        ConfigContextBuilder::default()
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Options used by [`get`](Self::get) when the caller passes none.
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Binds and validates the section at `section`.
    ///
    /// Never fails outright: a missing section, a conversion error or rule
    /// violations all produce an invalid [`ConfigResult`].
    pub fn get<T: BindTarget>(&self, section: &str, options: Option<&BindOptions>) -> ConfigResult<T> {
        binding::load(&self.tree, section, options.unwrap_or(&self.options))
    }

    /// [`get`](Self::get) with the overlay for `environment`, falling back to
    /// the base section when `section_environment` does not exist.
    pub fn get_for_environment<T: BindTarget>(
        &self,
        section: &str,
        environment: &str,
        options: Option<&BindOptions>,
    ) -> ConfigResult<T> {
        let options = options
            .cloned()
            .unwrap_or_default()
            .with_environment(environment);
        self.get(section, Some(&options))
    }

    /// [`get`](Self::get) with `throw_on_error` set. The outcome is still a
    /// result; see [`ConfigResult::into_result`] for a hard failure.
    pub fn get_validated<T: BindTarget>(
        &self,
        section: &str,
        options: Option<&BindOptions>,
    ) -> ConfigResult<T> {
        let mut options = options.cloned().unwrap_or_default();
        options.throw_on_error = true;
        self.get(section, Some(&options))
    }

    /// Validates every section of `sections`, returning one error per invalid
    /// section. A panic while binding one section is recorded for that section
    /// and the remaining sections are still checked.
    pub fn validate_all(&self, sections: &SectionSet) -> Vec<SectionError> {
        let errors: Vec<SectionError> = sections
            .entries()
            .iter()
            .filter_map(|entry| {
                match panic::catch_unwind(AssertUnwindSafe(|| (entry.check)(self))) {
                    Ok(outcome) => outcome,
                    Err(payload) => {
                        let cause = panic_message(payload.as_ref());
                        Some(
                            SectionError::new(
                                entry.path.clone(),
                                None,
                                format!("Configuration error: {cause}"),
                            )
                            .with_source(cause),
                        )
                    }
                }
            })
            .collect();

        if !errors.is_empty() {
            warn!(
                sections = sections.len(),
                failed = errors.len(),
                "configuration sections failed validation"
            );
        }
        errors
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "section binding panicked".to_string()
    }
}

/// Builder for constructing a [`ConfigContext`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigContextBuilder {
    tree: Option<ConfigTree>,
    options: Option<BindOptions>,
}

impl ConfigContextBuilder {
    /// Attaches the configuration tree sections are read from.
    pub fn with_tree(mut self, tree: ConfigTree) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Replaces the default options.
    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Builds the `ConfigContext`.
    ///
    /// Returns [`Error::Uninitialized`] if no tree was provided.
    pub fn build(self) -> Result<ConfigContext, Error> {
        Ok(ConfigContext {
            tree: self.tree.ok_or(Error::Uninitialized)?,
            options: self.options.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_tree, DatabaseConfig, EmailConfig, InvalidConfig};
    use serde::{Deserialize, Serialize};
    use validator::Validate;

    fn context() -> ConfigContext {
        ConfigContext::new(sample_tree())
    }

    #[test]
    fn test_builder_without_tree_is_uninitialized() {
        let result = ConfigContext::builder().build();
        assert!(matches!(result, Err(Error::Uninitialized)));
    }

    #[test]
    fn test_get_valid_section() {
        let result = context().get::<DatabaseConfig>("Database", None);

        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert_eq!(result.section_path(), "Database");
        assert_eq!(result.environment(), None);

        let value = result.value().unwrap();
        assert_eq!(value.connection_string, "Server=localhost;Database=TestDb");
        assert_eq!(value.timeout_seconds, 60);
        assert!(value.enable_retry);
    }

    #[test]
    fn test_get_missing_section() {
        let result = context().get::<DatabaseConfig>("NonExistent", None);

        assert!(!result.is_valid());
        assert!(result.value().is_none());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message().contains("not found"));
        assert_eq!(result.section_path(), "NonExistent");
    }

    #[test]
    fn test_get_without_validation_skips_rules() {
        let options = BindOptions::default().without_validation();
        let result = context().get::<InvalidConfig>("InvalidSection", Some(&options));

        assert!(result.is_valid());
        assert_eq!(result.value().unwrap().range_field, 50);
    }

    #[test]
    fn test_context_default_options_apply() {
        let context = ConfigContext::builder()
            .with_tree(sample_tree())
            .with_options(BindOptions::for_environment("Production"))
            .build()
            .unwrap();

        let result = context.get::<DatabaseConfig>("Database", None);
        assert_eq!(result.environment(), Some("Production"));
        assert_eq!(result.value().unwrap().timeout_seconds, 120);
    }

    #[test]
    fn test_environment_overlay_wins() {
        let result = context().get_for_environment::<DatabaseConfig>("Database", "Production", None);

        assert!(result.is_valid());
        assert_eq!(result.environment(), Some("Production"));
        assert_eq!(result.section_path(), "Database");

        let value = result.value().unwrap();
        assert_eq!(value.connection_string, "Server=prod-server;Database=ProdDb");
        assert_eq!(value.timeout_seconds, 120);
        assert!(!value.enable_retry);
    }

    #[test]
    fn test_missing_overlay_falls_back_to_base() {
        let result = context().get_for_environment::<DatabaseConfig>("Database", "Staging", None);

        assert!(result.is_valid());
        assert_eq!(result.environment(), None);
        assert_eq!(
            result.value().unwrap().connection_string,
            "Server=localhost;Database=TestDb"
        );
    }

    #[test]
    fn test_overlay_requires_the_separator() {
        let tree = crate::Config::builder()
            .with_source(
                crate::config::MemorySource::new()
                    .with("Database.ConnectionString", "base")
                    .with("DatabaseProduction.ConnectionString", "unrelated"),
            )
            .build()
            .unwrap();
        let context = ConfigContext::new(tree);

        let result = context.get_for_environment::<DatabaseConfig>("Database", "Production", None);
        assert!(result.is_valid(), "{:?}", result.errors());
        assert_eq!(result.environment(), None);
        assert_eq!(result.value().unwrap().connection_string, "base");

        let result = context.get::<DatabaseConfig>("Data_base", None);
        assert!(!result.is_valid());
        assert_eq!(
            result.error_summary(),
            "Configuration section 'Data_base' not found"
        );
    }

    #[test]
    fn test_missing_overlay_and_base() {
        let result =
            context().get_for_environment::<DatabaseConfig>("NonExistent", "Production", None);

        assert!(!result.is_valid());
        assert!(result.value().is_none());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.environment(), None);
    }

    #[test]
    fn test_get_for_environment_leaves_caller_options_alone() {
        let options = BindOptions::default();
        let _ = context().get_for_environment::<DatabaseConfig>("Database", "Production", Some(&options));
        assert_eq!(options.environment, None);
    }

    #[test]
    fn test_get_validated_valid_section() {
        let result = context().get_validated::<EmailConfig>("Email", None);

        assert!(result.is_valid());
        let value = result.value().unwrap();
        assert_eq!(value.smtp_host, "smtp.gmail.com");
        assert_eq!(value.port, 587);
        assert_eq!(value.from_address, "test@example.com");
    }

    #[test]
    fn test_get_validated_reports_every_violation() {
        let result = context().get_validated::<InvalidConfig>("InvalidSection", None);

        assert!(!result.is_valid());
        assert!(result.value().is_none());
        assert_eq!(result.errors().len(), 2);

        let messages: Vec<_> = result.errors().iter().map(|e| e.message()).collect();
        assert!(messages.iter().any(|m| m.contains("required")), "{messages:?}");
        assert!(messages.iter().any(|m| m.contains("range")), "{messages:?}");
    }

    #[test]
    fn test_get_validated_missing_section() {
        let result = context().get_validated::<EmailConfig>("NonExistent", None);

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message().contains("not found"));
    }

    #[test]
    fn test_binding_error_becomes_failure() {
        let tree = crate::Config::builder()
            .with_source(crate::config::MemorySource::new().with("Database.TimeoutSeconds", "soon"))
            .build()
            .unwrap();
        let result = ConfigContext::new(tree).get::<DatabaseConfig>("Database", None);

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0]
            .message()
            .starts_with("Configuration binding error:"));
    }

    #[test]
    fn test_get_is_repeatable() {
        let context = context();
        assert_eq!(
            context.get::<InvalidConfig>("InvalidSection", None),
            context.get::<InvalidConfig>("InvalidSection", None)
        );
        assert_eq!(
            context.get::<DatabaseConfig>("Database", None),
            context.get::<DatabaseConfig>("Database", None)
        );
    }

    #[test]
    fn test_validate_all_valid_sections() {
        let sections = SectionSet::new()
            .section::<DatabaseConfig>("Database")
            .section::<EmailConfig>("Email");

        assert!(context().validate_all(&sections).is_empty());
    }

    #[test]
    fn test_validate_all_accumulates_failures() {
        let sections = SectionSet::new()
            .section::<DatabaseConfig>("Database")
            .section::<InvalidConfig>("InvalidSection")
            .section::<EmailConfig>("NonExistent");

        let errors = context().validate_all(&sections);
        let paths: Vec<_> = errors.iter().map(|e| e.section_path()).collect();

        assert_eq!(paths, vec!["InvalidSection", "NonExistent"]);
        assert!(errors[0].message().starts_with("Validation failed: "));
        assert!(errors[1].message().contains("not found"));
    }

    #[test]
    fn test_validate_all_empty_set() {
        assert!(context().validate_all(&SectionSet::new()).is_empty());
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    struct Exploding {
        value: i32,
    }

    impl Default for Exploding {
        fn default() -> Self {
            panic!("no default available");
        }
    }

    #[test]
    fn test_validate_all_survives_a_panicking_section() {
        let sections = SectionSet::new()
            .section::<Exploding>("Database")
            .section::<InvalidConfig>("InvalidSection");

        let errors = context().validate_all(&sections);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].section_path(), "Database");
        assert_eq!(
            errors[0].message(),
            "Configuration error: no default available"
        );
        assert!(std::error::Error::source(&errors[0]).is_some());
        assert_eq!(errors[1].section_path(), "InvalidSection");
    }
}
