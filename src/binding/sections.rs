use std::any::type_name;
use std::fmt;

use super::BindTarget;
use crate::context::ConfigContext;
use crate::error::SectionError;

type SectionCheck = Box<dyn Fn(&ConfigContext) -> Option<SectionError> + Send + Sync>;

pub(crate) struct SectionEntry {
    pub(crate) path: String,
    pub(crate) type_name: &'static str,
    pub(crate) check: SectionCheck,
}

/// A typed list of sections to validate together.
///
/// ```
/// use sectionbind::SectionSet;
/// # use serde::{Deserialize, Serialize};
/// # use validator::Validate;
/// # #[derive(Default, Serialize, Deserialize, Validate)] struct DatabaseSettings {}
/// # #[derive(Default, Serialize, Deserialize, Validate)] struct EmailSettings {}
///
/// let sections = SectionSet::new()
///     .section::<DatabaseSettings>("Database")
///     .section::<EmailSettings>("Email");
/// assert_eq!(sections.len(), 2);
/// ```
#[derive(Default)]
#[must_use]
pub struct SectionSet {
    entries: Vec<SectionEntry>,
}

impl SectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path`, bound and validated as `T`.
    pub fn section<T: BindTarget>(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let check_path = path.clone();
        self.entries.push(SectionEntry {
            path,
            type_name: type_name::<T>(),
            check: Box::new(move |context| {
                let result = context.get_validated::<T>(&check_path, None);
                if result.is_valid() {
                    return None;
                }
                Some(SectionError::new(
                    check_path.clone(),
                    None,
                    format!("Validation failed: {}", result.error_summary()),
                ))
            }),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Section paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.path.as_str())
    }

    pub(crate) fn entries(&self) -> &[SectionEntry] {
        &self.entries
    }
}

impl fmt::Debug for SectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.path, e.type_name)))
            .finish()
    }
}
