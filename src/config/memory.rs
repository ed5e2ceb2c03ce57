use toml::Value;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// In-memory key/value pairs addressed by dotted paths.
///
/// ```
/// use sectionbind::config::MemorySource;
///
/// let source = MemorySource::new()
///     .with("Database.ConnectionString", "Server=localhost")
///     .with("Database.TimeoutSeconds", "60");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pairs: Vec<(String, String)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }
}

impl ConfigSource for MemorySource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        self.pairs
            .iter()
            .map(|(key, value)| {
                let path: Vec<String> = key.split('.').map(str::to_string).collect();
                if path.iter().any(String::is_empty) {
                    return Err(ConfigError::InvalidKey(key.clone()));
                }
                Ok(ConfigEntry::at_path(path, Value::String(value.clone())))
            })
            .collect()
    }
}
