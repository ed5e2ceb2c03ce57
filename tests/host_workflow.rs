use std::io::Write;

use sectionbind::config::MemorySource;
use sectionbind::{Config, ConfigContext, Error, Registry, SectionSet};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
struct DatabaseSettings {
    #[validate(length(min = 1, message = "Connection string is required"))]
    connection_string: String,
    #[validate(range(min = 1, max = 3600))]
    command_timeout_seconds: i32,
    enable_retry_policy: bool,
    #[validate(range(min = 1, max = 10))]
    max_retry_attempts: i32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            command_timeout_seconds: 30,
            enable_retry_policy: true,
            max_retry_attempts: 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
struct EmailSettings {
    #[validate(length(min = 1))]
    smtp_host: String,
    #[validate(range(min = 1, max = 65535))]
    smtp_port: u32,
    #[validate(length(min = 1), email)]
    from_address: String,
    #[validate(length(min = 1))]
    from_name: String,
    enable_ssl: bool,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            from_address: String::new(),
            from_name: String::new(),
            enable_ssl: true,
        }
    }
}

const APPSETTINGS: &str = r#"
[Database]
ConnectionString = "Server=localhost;Database=App"
CommandTimeoutSeconds = 30

[Database_Production]
ConnectionString = "Server=db.internal;Database=App"
CommandTimeoutSeconds = 120
MaxRetryAttempts = 5

[Email]
SmtpHost = "localhost"
SmtpPort = 1025
FromAddress = "dev@example.com"
FromName = "App (dev)"
EnableSsl = false
"#;

fn context_with(overrides: MemorySource) -> (NamedTempFile, ConfigContext) {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{APPSETTINGS}").unwrap();

    let tree = Config::builder()
        .with_file(file.path(), true)
        .with_source(overrides)
        .build()
        .unwrap();
    (file, ConfigContext::new(tree))
}

#[test]
fn test_full_workflow_development() {
    let (_file, context) = context_with(MemorySource::new());

    let mut registry = Registry::new();
    registry
        .add_config(context)
        .configure::<DatabaseSettings>("Database", None)
        .configure_for_environment::<EmailSettings>("Email", "Development", None);

    let sections = SectionSet::new()
        .section::<DatabaseSettings>("Database")
        .section::<EmailSettings>("Email");
    registry.validate_sections(&sections).unwrap();

    let database = registry.resolve::<DatabaseSettings>().unwrap();
    let email = registry.resolve::<EmailSettings>().unwrap();

    assert_eq!(database.connection_string, "Server=localhost;Database=App");
    assert_eq!(database.max_retry_attempts, 3);
    assert_eq!(email.smtp_port, 1025);
    assert!(!email.enable_ssl);
}

#[test]
fn test_production_overlay_from_file() {
    let (_file, context) = context_with(MemorySource::new());

    let result = context.get_for_environment::<DatabaseSettings>("Database", "Production", None);

    assert!(result.is_valid(), "{:?}", result.errors());
    assert_eq!(result.environment(), Some("Production"));
    let database = result.value().unwrap();
    assert_eq!(database.connection_string, "Server=db.internal;Database=App");
    assert_eq!(database.command_timeout_seconds, 120);
    assert_eq!(database.max_retry_attempts, 5);
    assert!(database.enable_retry_policy);
}

#[test]
fn test_overrides_can_break_a_section() {
    let (_file, context) = context_with(
        MemorySource::new()
            .with("Email.SmtpPort", "0")
            .with("Email.FromAddress", "nobody"),
    );

    let result = context.get_validated::<EmailSettings>("Email", None);
    let fields: Vec<_> = result.errors().iter().filter_map(|e| e.field()).collect();
    assert_eq!(fields, vec!["from_address", "smtp_port"]);

    let mut registry = Registry::new();
    registry.add_config(context);
    let outcome = registry.validate_sections(
        &SectionSet::new()
            .section::<DatabaseSettings>("Database")
            .section::<EmailSettings>("Email")
            .section::<EmailSettings>("Notifications"),
    );

    let Err(Error::Aggregate(aggregate)) = outcome else {
        panic!("expected an aggregate error");
    };
    let paths: Vec<_> = aggregate.errors().iter().map(|e| e.section_path()).collect();
    assert_eq!(paths, vec!["Email", "Notifications"]);

    let rendered = aggregate.to_string();
    assert!(rendered.contains("Section 'Email': Validation failed:"), "{rendered}");
    assert!(
        rendered.contains("Section 'Notifications': Validation failed: Configuration section 'Notifications' not found"),
        "{rendered}"
    );
}

#[test]
fn test_custom_rule_message_is_reported() {
    let (_file, context) = context_with(MemorySource::new().with("Database.ConnectionString", ""));

    let result = context.get::<DatabaseSettings>("Database", None);
    assert_eq!(result.error_summary(), "Connection string is required");
}
