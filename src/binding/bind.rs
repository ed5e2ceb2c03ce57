use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::Value;
use tracing::debug;

use super::de::{BindError, SectionDeserializer};
use crate::config::{merge_fields, ConfigTree};

/// Binds the section at `path` onto a default `T`.
///
/// Returns `Ok(None)` when the section does not exist. Keys the section does
/// not mention keep the value from `T::default()`.
///
/// Defaults are captured by serializing `T::default()` to TOML. When that
/// fails (a `u64` above `i64::MAX`, a map with non-string keys) the section is
/// bound on its own, so keys it leaves out must then be covered by
/// `#[serde(default)]` on `T`.
pub fn bind<T>(tree: &ConfigTree, path: &str) -> Result<Option<T>, BindError>
where
    T: Default + Serialize + DeserializeOwned,
{
    match tree.section(path) {
        Some(section) => bind_value(section.clone()).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn bind_value<T>(section: Value) -> Result<T, BindError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let target = match Value::try_from(T::default()) {
        Ok(mut defaults) => {
            overlay(&mut defaults, section);
            defaults
        }
        Err(err) => {
            debug!(error = %err, "defaults not representable, binding section alone");
            section
        }
    };
    T::deserialize(SectionDeserializer::new(target))
}

fn overlay(base: &mut Value, section: Value) {
    match (base, section) {
        (Value::Table(base), Value::Table(section)) => merge_fields(base, section),
        (base, section) => *base = section,
    }
}
