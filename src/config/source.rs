use toml::{Table, Value};

use super::ConfigError;

/// A value contributed by a source, placed at `path` below the root.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// A provider of configuration entries.
///
/// Sources are merged in registration order by [`Config`](super::Config);
/// later entries override earlier ones.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// Compares two struct field names: ASCII case is ignored, as are `_` and
/// `-` separators.
///
/// `ConnectionString`, `connection_string` and `CONNECTION-STRING` all name
/// the same field. Section paths use the stricter [`section_eq`].
pub fn key_eq(a: &str, b: &str) -> bool {
    fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
        s.chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
    }
    folded(a).eq(folded(b))
}

/// Compares two keys of the configuration tree. Only ASCII case is ignored,
/// so `Database_Production` and `DatabaseProduction` stay distinct sections.
pub fn section_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

type KeyEq = fn(&str, &str) -> bool;

fn matching_key(table: &Table, key: &str, eq: KeyEq) -> Option<String> {
    table.keys().find(|existing| eq(existing, key)).cloned()
}

pub fn merge_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    let key = matching_key(table, first, section_eq).unwrap_or_else(|| first.clone());

    if rest.is_empty() {
        match (table.get_mut(&key), value) {
            (Some(Value::Table(base)), Value::Table(overlay)) => deep_merge(base, overlay),
            (_, value) => {
                table.insert(key, value);
            }
        }
        return;
    }

    if !matches!(table.get(&key), Some(Value::Table(_))) {
        table.insert(key.clone(), Value::Table(Table::new()));
    }

    if let Some(Value::Table(nested)) = table.get_mut(&key) {
        merge_at_path(nested, rest, value);
    }
}

/// Merges `overlay` into `base`. Tables merge recursively; anything else
/// replaces the base value. Keys match with [`section_eq`] and keep the
/// spelling already present in `base`.
pub fn deep_merge(base: &mut Table, overlay: Table) {
    merge_tables(base, overlay, section_eq);
}

/// Like [`deep_merge`], but keys match as field names ([`key_eq`]).
pub(crate) fn merge_fields(base: &mut Table, overlay: Table) {
    merge_tables(base, overlay, key_eq);
}

fn merge_tables(base: &mut Table, overlay: Table, eq: KeyEq) {
    for (key, value) in overlay {
        let key = matching_key(base, &key, eq).unwrap_or(key);
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table, eq);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
