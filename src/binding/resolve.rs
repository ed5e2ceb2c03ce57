//! Environment overlay resolution.
//!
//! An environment `E` selects the section `Name_E` when it exists and falls
//! back to `Name` otherwise. A fallback reports no environment: the value did
//! not come from an environment-specific section.

use tracing::debug;

use crate::config::ConfigTree;

/// The section a binding will read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Path actually looked up in the tree.
    pub path: String,
    /// Environment whose overlay section was found, `None` on fallback.
    pub environment: Option<String>,
}

/// Builds `section_environment`, or `section` when no environment is given.
pub fn effective_path(section: &str, environment: Option<&str>) -> String {
    match environment {
        Some(env) if !env.is_empty() => format!("{section}_{env}"),
        _ => section.to_string(),
    }
}

/// Picks the overlay section when present, the base section otherwise.
///
/// Returns `None` when neither exists.
pub fn resolve(tree: &ConfigTree, section: &str, environment: Option<&str>) -> Option<Resolution> {
    if let Some(env) = environment.filter(|env| !env.is_empty()) {
        let overlay = effective_path(section, Some(env));
        if tree.exists(&overlay) {
            return Some(Resolution {
                path: overlay,
                environment: Some(env.to_string()),
            });
        }
        debug!(section, environment = env, "no overlay section, falling back to base");
    }

    tree.exists(section).then(|| Resolution {
        path: section.to_string(),
        environment: None,
    })
}
