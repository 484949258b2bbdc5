use std::io;

/// Errors raised while assembling an [`ApplicationRegistration`](crate::ApplicationRegistration).
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The builder was finished without any application source.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while assembling or starting a [`Server`](crate::Server).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A registration requires a named listener that was never configured.
    #[error("no listener named `{routing_name}` for application {application}")]
    RoutingNameNotFound {
        routing_name: String,
        application: String,
    },

    /// Two applications claim the same context root on one listener.
    #[error("context root {context_root} is registered twice on listener `{listener}`")]
    DuplicateContextRoot {
        listener: String,
        context_root: String,
    },

    /// A context root that is not a literal path prefix.
    #[error("invalid context root {context_root} on listener `{listener}`")]
    InvalidContextRoot {
        listener: String,
        context_root: String,
    },

    #[error("failed to bind listener `{listener}`: {source}")]
    Bind {
        listener: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid server config: {0}")]
    Config(String),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Result type alias using [`RegistrationError`].
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type alias using [`ServerError`].
pub type ServerResult<T> = Result<T, ServerError>;
