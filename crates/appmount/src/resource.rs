//! Application descriptors.
//!
//! A [`ResourceConfig`] is the mountable form of an application: an axum
//! [`Router`] plus the bookkeeping the server needs for diagnostics. It is
//! produced either directly or from an [`Application`].

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;

use axum::routing::MethodRouter;
use axum::Router;

use crate::metadata::ApplicationMetadata;

/// A web application that can be turned into a [`ResourceConfig`].
pub trait Application: Sized {
    /// Register this application's resources on `config`.
    fn configure(&self, config: ResourceConfig) -> ResourceConfig;

    /// Declared path and routing name of this application type.
    fn metadata() -> ApplicationMetadata {
        ApplicationMetadata::EMPTY
    }

    fn into_resource_config(self) -> ResourceConfig {
        ResourceConfig::for_application(self)
    }
}

/// Descriptor of a mountable application.
#[derive(Clone, Default)]
pub struct ResourceConfig {
    application_name: Option<String>,
    router: Router,
    resource_paths: Vec<String>,
    properties: BTreeMap<String, String>,
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a descriptor by letting `app` configure an empty one.
    pub fn for_application<A: Application>(app: A) -> Self {
        let mut config = app.configure(Self::new());
        if config.application_name.is_none() {
            config.application_name = Some(type_name::<A>().to_string());
        }
        config
    }

    /// Build a descriptor from the application type alone.
    pub fn for_application_type<A: Application + Default>() -> Self {
        Self::for_application(A::default())
    }

    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self.resource_paths.push(path.to_string());
        self
    }

    /// Merge the resources of `other` into this descriptor.
    ///
    /// Properties of `other` override properties with the same key. Overlapping
    /// routes panic, as they do in axum.
    pub fn merge(mut self, other: ResourceConfig) -> Self {
        self.router = self.router.merge(other.router);
        self.resource_paths.extend(other.resource_paths);
        self.properties.extend(other.properties);
        if self.application_name.is_none() {
            self.application_name = other.application_name;
        }
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }

    pub fn resource_paths(&self) -> &[String] {
        &self.resource_paths
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl fmt::Debug for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("application_name", &self.application_name)
            .field("resource_paths", &self.resource_paths)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// A descriptor is already an application; it is used as-is.
impl Application for ResourceConfig {
    fn configure(&self, config: ResourceConfig) -> ResourceConfig {
        config.merge(self.clone())
    }

    fn into_resource_config(self) -> ResourceConfig {
        self
    }
}
