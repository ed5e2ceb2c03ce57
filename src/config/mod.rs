//! Configuration loading: layered sources merged into a [`ConfigTree`].

mod builder;
mod env;
mod error;
mod file;
mod memory;
mod source;
mod tree;

pub use builder::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use memory::MemorySource;
pub use source::{key_eq, section_eq, ConfigEntry, ConfigSource};
pub use tree::ConfigTree;

pub(crate) use source::merge_fields;
