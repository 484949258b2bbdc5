//! Registration of axum applications with a multi-listener server.
//!
//! - [`ApplicationRegistration`] describes one application: its
//!   [`ResourceConfig`], context root, routing name and executor.
//! - [`ServerBuilder`] mounts registrations on named listeners and starts them.

pub mod config;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod registration;
pub mod resource;
pub mod server;

pub use config::{load_server_config, ListenerConfig, ServerConfig};
pub use error::{RegistrationError, RegistrationResult, ServerError, ServerResult};
pub use executor::{Executor, SharedExecutor};
pub use metadata::{ApplicationMetadata, RoutingName};
pub use registration::{ApplicationRegistration, RegistrationBuilder};
pub use resource::{Application, ResourceConfig};
pub use server::{RunningServer, Server, ServerBuilder, DEFAULT_LISTENER};
