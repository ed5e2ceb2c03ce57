//! A typed container for wiring bound sections into a host application.
//!
//! Registrations are deferred: [`Registry::configure`] records which section
//! backs a type, and the bind + validate pipeline runs the first time
//! [`Registry::resolve`] asks for that type. Resolved values are cached.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::binding::{BindOptions, BindTarget, SectionSet};
use crate::context::ConfigContext;
use crate::error::{AggregateError, SectionError};
use crate::Error;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&ConfigContext) -> Result<Instance, SectionError> + Send + Sync>;

struct Registration {
    section: String,
    factory: Factory,
    instance: OnceLock<Instance>,
}

/// Host-facing registration helpers.
///
/// ```
/// use sectionbind::{Config, ConfigContext, Registry, SectionSet};
/// use sectionbind::config::MemorySource;
/// use serde::{Deserialize, Serialize};
/// use validator::Validate;
///
/// #[derive(Debug, Default, Serialize, Deserialize, Validate)]
/// struct EmailSettings {
///     #[validate(length(min = 1))]
///     smtp_host: String,
/// }
///
/// let tree = Config::builder()
///     .with_source(MemorySource::new().with("Email.SmtpHost", "smtp.example.com"))
///     .build()?;
///
/// let mut registry = Registry::new();
/// registry
///     .add_config(ConfigContext::new(tree))
///     .configure::<EmailSettings>("Email", None)
///     .validate_sections(&SectionSet::new().section::<EmailSettings>("Email"))?;
///
/// let email = registry.resolve::<EmailSettings>()?;
/// assert_eq!(email.smtp_host, "smtp.example.com");
/// # Ok::<(), sectionbind::Error>(())
/// ```
#[derive(Default)]
pub struct Registry {
    context: Option<Arc<ConfigContext>>,
    instances: HashMap<TypeId, Instance>,
    registrations: HashMap<TypeId, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the configuration context, replacing any previous one.
    ///
    /// The context and its default options become resolvable from the
    /// registry.
    pub fn add_config(&mut self, context: ConfigContext) -> &mut Self {
        let context = Arc::new(context);
        self.insert(context.options().clone());
        self.instances
            .insert(TypeId::of::<ConfigContext>(), context.clone());
        self.context = Some(context);
        self
    }

    /// Registers a ready-made value.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.instances.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// Registers `T` as bound from `section`.
    ///
    /// Nothing is read until [`resolve`](Self::resolve) is called for `T`;
    /// an invalid section surfaces there as [`Error::Section`].
    pub fn configure<T>(&mut self, section: impl Into<String>, options: Option<BindOptions>) -> &mut Self
    where
        T: BindTarget + Send + Sync,
    {
        let section = section.into();
        let factory_section = section.clone();
        let factory: Factory = Box::new(move |context| {
            let result = context.get_validated::<T>(&factory_section, options.as_ref());
            if !result.is_valid() {
                return Err(SectionError::new(
                    factory_section.clone(),
                    options.as_ref().and_then(|o| o.environment.clone()),
                    format!("Configuration validation failed: {}", result.error_summary()),
                ));
            }
            match result.into_value() {
                Some(value) => Ok(Arc::new(value) as Instance),
                None => Err(SectionError::new(
                    factory_section.clone(),
                    None,
                    "Configuration validation failed: no value bound",
                )),
            }
        });

        debug!(section = %section, target = type_name::<T>(), "registered configuration section");
        self.instances.remove(&TypeId::of::<T>());
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                section,
                factory,
                instance: OnceLock::new(),
            },
        );
        self
    }

    /// [`configure`](Self::configure) reading the `environment` overlay of
    /// `section`, with fallback to the base section.
    pub fn configure_for_environment<T>(
        &mut self,
        section: impl Into<String>,
        environment: impl Into<String>,
        options: Option<BindOptions>,
    ) -> &mut Self
    where
        T: BindTarget + Send + Sync,
    {
        let options = options.unwrap_or_default().with_environment(environment);
        self.configure::<T>(section, Some(options))
    }

    /// Validates every section of `sections` now.
    ///
    /// Fails with [`Error::Aggregate`] listing each invalid section; one bad
    /// section does not stop the others from being checked.
    pub fn validate_sections(&mut self, sections: &SectionSet) -> Result<&mut Self, Error> {
        let context = self.context.as_ref().ok_or(Error::Uninitialized)?;
        let errors = context.validate_all(sections);
        if !errors.is_empty() {
            return Err(AggregateError::new(errors).into());
        }
        Ok(self)
    }

    /// Returns the value registered for `T`, binding it on first use.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>, Error> {
        let key = TypeId::of::<T>();
        if let Some(instance) = self.instances.get(&key) {
            return downcast(instance.clone());
        }

        let registration = self
            .registrations
            .get(&key)
            .ok_or(Error::NotRegistered(type_name::<T>()))?;
        if let Some(instance) = registration.instance.get() {
            return downcast(instance.clone());
        }

        let context = self.context.as_ref().ok_or(Error::Uninitialized)?;
        debug!(section = %registration.section, target = type_name::<T>(), "binding registered section");
        let instance = (registration.factory)(context)?;
        downcast(registration.instance.get_or_init(|| instance).clone())
    }

    pub fn contains<T: Any>(&self) -> bool {
        let key = TypeId::of::<T>();
        self.instances.contains_key(&key) || self.registrations.contains_key(&key)
    }
}

fn downcast<T: Any + Send + Sync>(instance: Instance) -> Result<Arc<T>, Error> {
    instance
        .downcast::<T>()
        .map_err(|_| Error::NotRegistered(type_name::<T>()))
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections: Vec<_> = self
            .registrations
            .values()
            .map(|r| r.section.as_str())
            .collect();
        sections.sort_unstable();
        f.debug_struct("Registry")
            .field("initialized", &self.context.is_some())
            .field("instances", &self.instances.len())
            .field("sections", &sections)
            .finish()
    }
}
