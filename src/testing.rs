//! Section types and a sample tree shared by the unit tests.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{Config, ConfigTree, MemorySource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub connection_string: String,
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: i32,
    pub enable_retry: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            timeout_seconds: 30,
            enable_retry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct EmailConfig {
    #[validate(length(min = 1))]
    pub smtp_host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
    #[validate(length(min = 1), email)]
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            port: 587,
            from_address: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub(crate) struct InvalidConfig {
    #[validate(length(min = 1))]
    pub required_field: String,
    #[validate(range(min = 1, max = 10))]
    pub range_field: i32,
}

pub(crate) fn sample_tree() -> ConfigTree {
    Config::builder()
        .with_source(MemorySource::from_pairs([
            ("Database.ConnectionString", "Server=localhost;Database=TestDb"),
            ("Database.TimeoutSeconds", "60"),
            ("Database.EnableRetry", "true"),
            ("Database_Production.ConnectionString", "Server=prod-server;Database=ProdDb"),
            ("Database_Production.TimeoutSeconds", "120"),
            ("Database_Production.EnableRetry", "false"),
            ("Email.SmtpHost", "smtp.gmail.com"),
            ("Email.Port", "587"),
            ("Email.FromAddress", "test@example.com"),
            ("InvalidSection.RequiredField", ""),
            ("InvalidSection.RangeField", "50"),
        ]))
        .build()
        .expect("in-memory sources always load")
}
