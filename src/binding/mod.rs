//! The bind-then-validate pipeline.
//!
//! [`load`] resolves the section (with environment fallback), binds it onto a
//! default value of the target type and, when enabled, runs the declared
//! validation rules. Every expected failure (missing section, conversion
//! error, rule violation) comes back inside the [`ConfigResult`].

mod bind;
mod de;
mod options;
mod resolve;
mod result;
mod sections;
mod validate;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use validator::Validate;

use crate::config::ConfigTree;

pub use bind::bind;
pub use de::BindError;
pub use options::BindOptions;
pub use resolve::{effective_path, resolve, Resolution};
pub use result::{ConfigResult, ValidationFailure};
pub use sections::SectionSet;
pub use validate::validate;

/// Types a section can be bound onto.
///
/// `Default` supplies values for keys the section leaves out, `Serialize`
/// lets the binder overlay the section on those defaults, and `Validate`
/// carries the declared rules (a type without rules still derives it).
pub trait BindTarget: Default + Serialize + DeserializeOwned + Validate + 'static {}

impl<T> BindTarget for T where T: Default + Serialize + DeserializeOwned + Validate + 'static {}

pub(crate) fn load<T: BindTarget>(
    tree: &ConfigTree,
    section: &str,
    options: &BindOptions,
) -> ConfigResult<T> {
    let requested = options.effective_environment();

    let Some(resolution) = resolve(tree, section, requested) else {
        warn!(section, environment = ?requested, "configuration section not found");
        return not_found(section);
    };

    let value = match bind::<T>(tree, &resolution.path) {
        Ok(Some(value)) => value,
        Ok(None) => return not_found(section),
        Err(err) => {
            warn!(section, path = %resolution.path, error = %err, "configuration binding failed");
            return ConfigResult::failure(
                vec![ValidationFailure::new(format!(
                    "Configuration binding error: {err}"
                ))],
                section,
                None,
            );
        }
    };

    if options.validate_rules {
        let failures = validate(&value);
        if !failures.is_empty() {
            warn!(
                section,
                environment = ?resolution.environment,
                failures = failures.len(),
                "configuration section failed validation"
            );
            return ConfigResult::failure(failures, section, resolution.environment);
        }
    }

    debug!(section, path = %resolution.path, "configuration section bound");
    ConfigResult::success(value, section, resolution.environment)
}

fn not_found<T>(section: &str) -> ConfigResult<T> {
    ConfigResult::failure(
        vec![ValidationFailure::new(format!(
            "Configuration section '{section}' not found"
        ))],
        section,
        None,
    )
}
