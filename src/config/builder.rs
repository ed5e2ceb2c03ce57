use std::path::Path;

use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::source::{merge_at_path, ConfigSource};
use super::tree::ConfigTree;
use super::ConfigError;

/// Builder for the layered configuration sections are bound from.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely. Keys from different sources are
/// matched ignoring case and `_`/`-`, so `[Database]` from a file and
/// `APP__DATABASE__...` from the environment land in the same section.
///
/// ## Example
///
/// ```no_run
/// use sectionbind::Config;
///
/// let tree = Config::builder()
///     .with_file("config/appsettings.toml", true)
///     .with_file("config/appsettings.local.toml", false)
///     .with_env("APP", "__")
///     .build()?;
///
/// assert!(tree.exists("Database"));
/// # Ok::<(), sectionbind::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads configuration from environment variables with the given prefix.
    ///
    /// `PREFIX<sep>Section<sep>Key` maps to `Section.Key`. Segments are
    /// lowercased; binding is case-insensitive so this does not matter to
    /// callers.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds any other source, e.g. a [`MemorySource`](super::MemorySource).
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Loads and merges every source into a [`ConfigTree`].
    pub fn build(self) -> Result<ConfigTree, ConfigError> {
        let mut merged = toml::Table::new();

        for source in &self.sources {
            let entries = source.entries()?;
            debug!(source = ?source, entries = entries.len(), "merging configuration source");
            for entry in entries {
                merge_at_path(&mut merged, &entry.path, entry.value);
            }
        }

        Ok(ConfigTree::new(merged))
    }
}
