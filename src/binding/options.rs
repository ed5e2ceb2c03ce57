use serde::{Deserialize, Serialize};

/// Behavior toggles for one bind operation.
///
/// Only `environment` and `validate_rules` change what a bind does.
/// `throw_on_error`, `use_cache`, `cache_duration_seconds` and
/// `enable_hot_reload` are carried for hosts that persist or forward their
/// options; the binding pipeline ignores them. Use
/// [`ConfigResult::into_result`](super::ConfigResult::into_result) or the
/// [`Registry`](crate::Registry) when an invalid section must become an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    /// Overlay suffix: `Database` with `Production` reads `Database_Production`.
    pub environment: Option<String>,
    /// Run the declared validation rules after binding.
    pub validate_rules: bool,
    pub throw_on_error: bool,
    pub use_cache: bool,
    pub cache_duration_seconds: u64,
    pub enable_hot_reload: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            environment: None,
            validate_rules: true,
            throw_on_error: false,
            use_cache: true,
            cache_duration_seconds: 300,
            enable_hot_reload: false,
        }
    }
}

impl BindOptions {
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self::default().with_environment(environment)
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn without_validation(mut self) -> Self {
        self.validate_rules = false;
        self
    }

    /// The environment to probe, with empty strings treated as absent.
    pub fn effective_environment(&self) -> Option<&str> {
        self.environment.as_deref().filter(|env| !env.is_empty())
    }
}
