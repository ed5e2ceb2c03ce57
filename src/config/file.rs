//! File-based configuration source.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// A configuration source that loads a TOML file.
///
/// Top-level tables become sections: `[Database]` and `[Database_Production]`
/// are both addressable by name. Required files that don't exist cause an
/// error; optional files that don't exist contribute nothing.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    pub fn required(path: impl AsRef<Path>) -> Self {
        Self::new(path, true)
    }

    pub fn optional(path: impl AsRef<Path>) -> Self {
        Self::new(path, false)
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                debug!(path = %self.path.display(), "optional config file not present");
                return Ok(vec![]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound(self.path.clone()));
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(vec![ConfigEntry::root(table)])
    }
}
