use toml::Value;
use tracing::debug;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Reads configuration from prefixed environment variables.
///
/// `APP__DATABASE_PRODUCTION__TIMEOUTSECONDS=120` with prefix `APP` and
/// separator `__` lands at `database_production.timeoutseconds`. Values stay
/// strings; the binder converts them to the target field's type.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn collect<I>(&self, vars: I) -> Vec<ConfigEntry>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);

        vars.into_iter()
            .filter_map(|(key, value)| {
                let path_str = key.strip_prefix(&prefix_with_sep)?;
                let path: Vec<String> = path_str
                    .split(self.separator.as_str())
                    .map(|s| s.to_lowercase())
                    .collect();
                if path.iter().any(|segment| segment.is_empty()) {
                    return None;
                }
                Some(ConfigEntry::at_path(path, Value::String(value)))
            })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let vars = std::env::vars_os().filter_map(|(key, value)| {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    debug!(key = %key, "skipping environment variable with non UTF-8 value");
                    None
                }
                _ => None,
            }
        });
        Ok(self.collect(vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefixed_vars_become_paths() {
        let source = EnvSource::new("APP", "__");
        let entries = source.collect(vars(&[
            ("APP__DATABASE__TIMEOUTSECONDS", "90"),
            ("OTHER__DATABASE__TIMEOUTSECONDS", "1"),
        ]));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, vec!["database", "timeoutseconds"]);
        assert_eq!(entries[0].value.as_str(), Some("90"));
    }

    #[test]
    fn test_single_underscore_stays_in_segment() {
        let source = EnvSource::new("APP", "__");
        let entries = source.collect(vars(&[(
            "APP__DATABASE_PRODUCTION__ENABLERETRY",
            "false",
        )]));

        assert_eq!(entries[0].path, vec!["database_production", "enableretry"]);
    }

    #[test]
    fn test_entries_read_the_process_environment() {
        let source = EnvSource::new("SECTIONBIND_ENV_TEST_UNSET_PREFIX", "__");
        assert!(source.entries().unwrap().is_empty());
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let source = EnvSource::new("APP", "__");
        let entries = source.collect(vars(&[("APP__", "x"), ("APP__A____B", "y")]));

        assert!(entries.is_empty());
    }
}
