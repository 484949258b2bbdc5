/// Named listener an application binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingName {
    pub name: &'static str,
    /// Fail server assembly when no listener carries this name.
    pub required: bool,
}

impl RoutingName {
    /// An optional routing name; the server falls back to its default listener.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }

    /// A routing name whose listener must exist.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }
}

/// Type-level metadata of an application.
///
/// Declared once per application type through
/// [`Application::metadata`](crate::Application::metadata), and read by the
/// registration builder to fill in a context root and routing name the
/// caller did not set explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationMetadata {
    /// Declared application path, used as the context root.
    pub path: Option<&'static str>,
    pub routing_name: Option<RoutingName>,
}

impl ApplicationMetadata {
    pub const EMPTY: Self = Self {
        path: None,
        routing_name: None,
    };

    pub const fn new() -> Self {
        Self::EMPTY
    }

    pub const fn with_path(self, path: &'static str) -> Self {
        Self {
            path: Some(path),
            ..self
        }
    }

    pub const fn with_routing_name(self, routing_name: RoutingName) -> Self {
        Self {
            routing_name: Some(routing_name),
            ..self
        }
    }
}
