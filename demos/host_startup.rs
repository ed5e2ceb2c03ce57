//! Host startup: load settings, register typed sections, refuse to start on
//! invalid configuration.
//!
//! ```text
//! cargo run --example host_startup
//! APP_ENVIRONMENT=Production cargo run --example host_startup
//! DEMO__EMAIL__SMTPPORT=0 cargo run --example host_startup   # exits with 1
//! ```

use sectionbind::{Config, ConfigContext, Error, Registry, SectionSet};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
struct DatabaseSettings {
    #[validate(length(min = 1, message = "Connection string is required"))]
    connection_string: String,
    #[validate(range(min = 1, max = 3600, message = "Timeout must be between 1 and 3600 seconds"))]
    command_timeout_seconds: u32,
    enable_retry_policy: bool,
    #[validate(range(min = 1, max = 10, message = "Retry count must be between 1 and 10"))]
    max_retry_attempts: u32,
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
    #[validate(length(min = 1, message = "SMTP host is required"))]
    smtp_host: String,
    #[validate(range(min = 1, max = 65535, message = "SMTP port must be between 1 and 65535"))]
    smtp_port: u32,
    #[validate(email(message = "Sender address must be a valid e-mail address"))]
    from_address: String,
    #[validate(length(min = 1, message = "Sender name is required"))]
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

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "Development".into());

    let tree = Config::builder()
        .with_file("demos/appsettings.toml", true)
        .with_file("demos/appsettings.local.toml", false)
        .with_env("DEMO", "__")
        .build()?;

    let mut registry = Registry::new();
    registry
        .add_config(ConfigContext::new(tree))
        .configure_for_environment::<DatabaseSettings>("Database", environment.as_str(), None)
        .configure_for_environment::<EmailSettings>("Email", environment.as_str(), None);

    // Production must ship its own overlay sections; elsewhere the base ones are checked.
    let sections = if environment == "Production" {
        SectionSet::new()
            .section::<DatabaseSettings>("Database_Production")
            .section::<EmailSettings>("Email_Production")
    } else {
        SectionSet::new()
            .section::<DatabaseSettings>("Database")
            .section::<EmailSettings>("Email")
    };

    match registry.validate_sections(&sections) {
        Ok(_) => println!("All configuration sections validated."),
        Err(Error::Aggregate(aggregate)) => {
            eprintln!("Configuration validation failed:");
            for error in aggregate.errors() {
                eprintln!("  - {}: {}", error.section_path(), error.message());
            }
            eprintln!("Refusing to start with invalid configuration.");
            std::process::exit(1);
        }
        Err(other) => return Err(other),
    }

    let database = registry.resolve::<DatabaseSettings>()?;
    let email = registry.resolve::<EmailSettings>()?;

    println!("Starting in {environment}");
    println!(
        "  database: {} (timeout {}s, retries {})",
        database.connection_string, database.command_timeout_seconds, database.max_retry_attempts
    );
    println!(
        "  email:    {}:{} as {} <{}>",
        email.smtp_host, email.smtp_port, email.from_name, email.from_address
    );

    Ok(())
}
