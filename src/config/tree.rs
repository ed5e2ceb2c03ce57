use toml::{Table, Value};

use super::source::section_eq;

/// The merged configuration: nested sections of string keys.
///
/// Section paths are dotted (`App.Database`) and every segment is matched
/// with [`section_eq`], so lookups ignore ASCII case but not separators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Table,
}

impl ConfigTree {
    pub fn new(root: Table) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    /// Returns the value stored at `path`.
    ///
    /// A section exists when it holds a scalar or an array, or a table with at
    /// least one key. Empty tables are treated as absent.
    pub fn section(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next().filter(|s| !s.is_empty())?;

        let mut current = lookup(&self.root, first)?;
        for segment in segments {
            current = lookup(current.as_table()?, segment)?;
        }

        match current {
            Value::Table(table) if table.is_empty() => None,
            value => Some(value),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.section(path).is_some()
    }

    /// Returns the scalar at `path` rendered as a string.
    pub fn get_str(&self, path: &str) -> Option<String> {
        match self.section(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Datetime(dt) => Some(dt.to_string()),
            Value::Array(_) | Value::Table(_) => None,
        }
    }
}

fn lookup<'a>(table: &'a Table, segment: &str) -> Option<&'a Value> {
    if segment.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(key, _)| section_eq(key, segment))
        .map(|(_, value)| value)
}
