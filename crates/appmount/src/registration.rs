//! Application registrations.
//!
//! An [`ApplicationRegistration`] bundles a [`ResourceConfig`] with the
//! server-side settings needed to mount it: context root, routing name and
//! executor. Registrations are assembled through [`RegistrationBuilder`] and
//! are immutable afterwards.

use std::any::type_name;

use crate::error::{RegistrationError, RegistrationResult};
use crate::executor::SharedExecutor;
use crate::metadata::ApplicationMetadata;
use crate::resource::{Application, ResourceConfig};

pub const DEFAULT_CONTEXT_ROOT: &str = "/";

/// An application ready to be passed to
/// [`ServerBuilder::add_application`](crate::ServerBuilder::add_application).
#[derive(Debug)]
pub struct ApplicationRegistration {
    context_root: String,
    resource_config: ResourceConfig,
    executor: Option<SharedExecutor>,
    app_class_name: Option<String>,
    routing_name: Option<String>,
    routing_name_required: bool,
}

impl ApplicationRegistration {
    /// Register `app` on the root context with the server default executor,
    /// unless its metadata declares otherwise.
    pub fn create<A: Application>(app: A) -> RegistrationResult<Self> {
        Self::builder().application(app).build()
    }

    /// Same as [`create`](Self::create), building the application from its type.
    pub fn create_for_type<A: Application + Default>() -> RegistrationResult<Self> {
        Self::builder().application_type::<A>().build()
    }

    pub fn builder() -> RegistrationBuilder {
        RegistrationBuilder::default()
    }

    pub fn context_root(&self) -> &str {
        &self.context_root
    }

    pub fn resource_config(&self) -> &ResourceConfig {
        &self.resource_config
    }

    /// Executor for this application; `None` means the server default.
    pub fn executor(&self) -> Option<&SharedExecutor> {
        self.executor.as_ref()
    }

    /// Type name of the application this registration was built from.
    ///
    /// `None` when the registration was given a bare descriptor.
    pub fn app_class_name(&self) -> Option<&str> {
        self.app_class_name.as_deref()
    }

    pub fn routing_name(&self) -> Option<&str> {
        self.routing_name.as_deref()
    }

    pub fn routing_name_required(&self) -> bool {
        self.routing_name_required
    }

    pub fn into_resource_config(self) -> ResourceConfig {
        self.resource_config
    }
}

/// Fluent builder for [`ApplicationRegistration`].
///
/// Context root and routing name declared in [`Application::metadata`] are
/// only applied while the corresponding field is still unset, so explicit
/// setters called after [`application`](Self::application) always win, while
/// explicit values set before it are kept.
#[derive(Debug, Default)]
pub struct RegistrationBuilder {
    context_root: Option<String>,
    config: Option<ResourceConfig>,
    executor: Option<SharedExecutor>,
    app_class_name: Option<String>,
    routing_name: Option<String>,
    routing_name_required: bool,
}

impl RegistrationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context root to expose this application on, defaults to `/`.
    pub fn context_root(mut self, context_root: impl Into<String>) -> Self {
        self.context_root = Some(context_root.into());
        self
    }

    /// Name of the listener to serve this application on.
    pub fn routing_name(mut self, routing_name: impl Into<String>, required: bool) -> Self {
        self.routing_name = Some(routing_name.into());
        self.routing_name_required = required;
        self
    }

    /// Use `config` as the application, replacing any previous one.
    pub fn config(mut self, config: ResourceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `app` as the application, replacing any previous one.
    pub fn application<A: Application>(mut self, app: A) -> Self {
        self.config = Some(app.into_resource_config());
        self.apply_metadata::<A>();
        self
    }

    /// Use an application built from type `A`, replacing any previous one.
    pub fn application_type<A: Application + Default>(mut self) -> Self {
        self.config = Some(ResourceConfig::for_application_type::<A>());
        self.apply_metadata::<A>();
        self
    }

    /// Executor for this application's requests. May be shared between
    /// applications; if none is set the server default is used.
    pub fn executor(mut self, executor: SharedExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> RegistrationResult<ApplicationRegistration> {
        let Some(resource_config) = self.config else {
            return Err(RegistrationError::Configuration(
                "no application, application type or resource config was set".to_string(),
            ));
        };
        let context_root = self
            .context_root
            .unwrap_or_else(|| DEFAULT_CONTEXT_ROOT.to_string());

        tracing::debug!(
            context_root = %context_root,
            application = self.app_class_name.as_deref().unwrap_or("-"),
            routing_name = self.routing_name.as_deref().unwrap_or("-"),
            "built application registration"
        );

        Ok(ApplicationRegistration {
            context_root,
            resource_config,
            executor: self.executor,
            app_class_name: self.app_class_name,
            routing_name: self.routing_name,
            routing_name_required: self.routing_name_required,
        })
    }

    fn apply_metadata<A: Application>(&mut self) {
        let metadata = A::metadata();
        self.infer_context_root(&metadata);
        self.infer_routing_name(&metadata);
        self.app_class_name = Some(type_name::<A>().to_string());
    }

    fn infer_context_root(&mut self, metadata: &ApplicationMetadata) {
        if self.context_root.is_some() {
            return;
        }
        if let Some(path) = metadata.path {
            tracing::debug!(path, "context root taken from application metadata");
            self.context_root = Some(path.to_string());
        }
    }

    fn infer_routing_name(&mut self, metadata: &ApplicationMetadata) {
        if self.routing_name.is_some() {
            return;
        }
        if let Some(routing) = metadata.routing_name {
            tracing::debug!(
                routing_name = routing.name,
                required = routing.required,
                "routing name taken from application metadata"
            );
            self.routing_name = Some(routing.name.to_string());
            self.routing_name_required = routing.required;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RoutingName;
    use axum::routing::get;
    use tokio::runtime::Handle;

    async fn ok() -> &'static str {
        "ok"
    }

    #[derive(Default)]
    struct Plain;

    impl Application for Plain {
        fn configure(&self, config: ResourceConfig) -> ResourceConfig {
            config.route("/plain", get(ok))
        }
    }

    #[derive(Default)]
    struct Foo;

    impl Application for Foo {
        fn configure(&self, config: ResourceConfig) -> ResourceConfig {
            config.route("/foo", get(ok))
        }

        fn metadata() -> ApplicationMetadata {
            ApplicationMetadata::new().with_path("/foo")
        }
    }

    #[derive(Default)]
    struct Admin;

    impl Application for Admin {
        fn configure(&self, config: ResourceConfig) -> ResourceConfig {
            config.route("/users", get(ok))
        }

        fn metadata() -> ApplicationMetadata {
            ApplicationMetadata::new()
                .with_path("/admin")
                .with_routing_name(RoutingName::required("admin"))
        }
    }

    #[test]
    fn build_without_application_fails() {
        let error = RegistrationBuilder::new()
            .context_root("/api")
            .routing_name("admin", true)
            .build()
            .expect_err("must fail");
        assert!(matches!(error, RegistrationError::Configuration(_)));
    }

    #[test]
    fn context_root_defaults_to_slash() {
        let registration = ApplicationRegistration::create(Plain).expect("build");
        assert_eq!(registration.context_root(), "/");
        assert_eq!(registration.routing_name(), None);
        assert!(!registration.routing_name_required());
        assert!(registration.executor().is_none());
        assert_eq!(registration.app_class_name(), Some(type_name::<Plain>()));
    }

    #[test]
    fn explicit_context_root_wins_in_either_order() {
        let before = ApplicationRegistration::builder()
            .context_root("/api")
            .application_type::<Foo>()
            .build()
            .expect("build");
        let after = ApplicationRegistration::builder()
            .application_type::<Foo>()
            .context_root("/api")
            .build()
            .expect("build");
        assert_eq!(before.context_root(), "/api");
        assert_eq!(after.context_root(), "/api");
    }

    #[test]
    fn application_path_metadata_sets_context_root() {
        let registration = ApplicationRegistration::create_for_type::<Foo>().expect("build");
        assert_eq!(registration.context_root(), "/foo");
        assert_eq!(registration.resource_config().resource_paths(), ["/foo".to_string()]);
    }

    #[test]
    fn routing_name_metadata_sets_name_and_required_flag() {
        let registration = ApplicationRegistration::create(Admin).expect("build");
        assert_eq!(registration.routing_name(), Some("admin"));
        assert!(registration.routing_name_required());
        assert_eq!(registration.context_root(), "/admin");
    }

    #[test]
    fn explicit_routing_name_is_not_overwritten() {
        let registration = ApplicationRegistration::builder()
            .routing_name("internal", false)
            .application(Admin)
            .build()
            .expect("build");
        assert_eq!(registration.routing_name(), Some("internal"));
        assert!(!registration.routing_name_required());
        assert_eq!(registration.context_root(), "/admin");
    }

    #[test]
    fn second_application_type_replaces_descriptor_and_keeps_inferred_values() {
        let registration = ApplicationRegistration::builder()
            .application_type::<Foo>()
            .application_type::<Admin>()
            .build()
            .expect("build");
        assert_eq!(registration.app_class_name(), Some(type_name::<Admin>()));
        assert_eq!(
            registration.resource_config().resource_paths(),
            ["/users".to_string()]
        );
        // Foo already set the context root; Admin only fills the routing name.
        assert_eq!(registration.context_root(), "/foo");
        assert_eq!(registration.routing_name(), Some("admin"));
        assert!(registration.routing_name_required());
    }

    #[test]
    fn second_application_type_infers_what_the_first_left_unset() {
        let registration = ApplicationRegistration::builder()
            .application_type::<Plain>()
            .application_type::<Foo>()
            .build()
            .expect("build");
        assert_eq!(registration.context_root(), "/foo");
        assert_eq!(registration.app_class_name(), Some(type_name::<Foo>()));
    }

    #[test]
    fn resource_config_application_is_used_directly() {
        let config = ResourceConfig::new()
            .route("/direct", get(ok))
            .property("source", "descriptor");
        let registration = ApplicationRegistration::builder()
            .application(config)
            .build()
            .expect("build");
        assert_eq!(
            registration.resource_config().resource_paths(),
            ["/direct".to_string()]
        );
        assert_eq!(registration.resource_config().application_name(), None);
        assert_eq!(
            registration.app_class_name(),
            Some(type_name::<ResourceConfig>())
        );
    }

    #[test]
    fn descriptor_replaces_application_but_keeps_inferred_fields() {
        let registration = ApplicationRegistration::builder()
            .application(Admin)
            .config(ResourceConfig::new().route("/replacement", get(ok)))
            .build()
            .expect("build");
        assert_eq!(
            registration.resource_config().resource_paths(),
            ["/replacement".to_string()]
        );
        assert_eq!(registration.context_root(), "/admin");
        assert_eq!(registration.routing_name(), Some("admin"));
    }

    #[test]
    fn registration_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApplicationRegistration>();
        assert_send_sync::<ResourceConfig>();
        assert_send_sync::<SharedExecutor>();

        let registration =
            std::sync::Arc::new(ApplicationRegistration::create_for_type::<Foo>().expect("build"));
        let reader = std::sync::Arc::clone(&registration);
        let context_root = std::thread::spawn(move || reader.context_root().to_string())
            .join()
            .expect("reader thread");
        assert_eq!(context_root, registration.context_root());
    }

    #[tokio::test]
    async fn executor_is_passed_through() {
        let executor = SharedExecutor::from(Handle::current());
        let registration = ApplicationRegistration::builder()
            .application(Plain)
            .executor(executor.clone())
            .build()
            .expect("build");
        let stored = registration.executor().expect("executor");
        assert!(stored.ptr_eq(&executor));
    }
}
