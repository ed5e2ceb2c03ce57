//! Bind named configuration sections onto typed structs.
//!
//! A [`ConfigContext`] wraps a merged [`ConfigTree`]. Sections are looked up
//! by name, optionally through an environment overlay (`Database_Production`
//! falling back to `Database`), bound onto a default value of the target type
//! and checked against the rules it declares with [`validator`].

pub mod binding;
pub mod config;
pub mod context;
mod error;
pub mod registry;

#[cfg(test)]
mod testing;

pub use binding::{BindError, BindOptions, BindTarget, ConfigResult, SectionSet, ValidationFailure};
pub use config::{Config, ConfigError, ConfigTree};
pub use context::ConfigContext;
pub use error::{AggregateError, Error, SectionError};
pub use registry::Registry;
