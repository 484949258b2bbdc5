use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::executor::SharedExecutor;
use crate::registration::{ApplicationRegistration, DEFAULT_CONTEXT_ROOT};

/// Name of the listener applications without a routing name are served on.
pub const DEFAULT_LISTENER: &str = "@default";

/// Collects listeners and application registrations into a [`Server`].
pub struct ServerBuilder {
    default_addr: SocketAddr,
    listeners: Vec<(String, SocketAddr)>,
    default_executor: Option<SharedExecutor>,
    applications: Vec<ApplicationRegistration>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// A builder with only the default listener, bound to a random local port.
    pub fn new() -> Self {
        Self {
            default_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            listeners: Vec::new(),
            default_executor: None,
            applications: Vec::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let mut builder = Self::new().address(config.addr()?);
        for listener in &config.listeners {
            builder = builder.add_listener(listener.name.clone(), listener.addr()?);
        }
        Ok(builder)
    }

    /// Address of the default listener.
    pub fn address(mut self, addr: SocketAddr) -> Self {
        self.default_addr = addr;
        self
    }

    /// Add a named listener. A second listener with the same name replaces the first.
    pub fn add_listener(mut self, name: impl Into<String>, addr: SocketAddr) -> Self {
        let name = name.into();
        if name == DEFAULT_LISTENER {
            self.default_addr = addr;
            return self;
        }
        match self.listeners.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = addr,
            None => self.listeners.push((name, addr)),
        }
        self
    }

    /// Executor for applications that do not configure their own.
    pub fn default_executor(mut self, executor: SharedExecutor) -> Self {
        self.default_executor = Some(executor);
        self
    }

    pub fn add_application(mut self, application: ApplicationRegistration) -> Self {
        self.applications.push(application);
        self
    }

    /// Mount every registered application on its listener.
    pub fn build(self) -> ServerResult<Server> {
        let mut slots = vec![ListenerSlot::new(DEFAULT_LISTENER, self.default_addr)];
        slots.extend(
            self.listeners
                .into_iter()
                .map(|(name, addr)| ListenerSlot::new(&name, addr)),
        );

        for registration in self.applications {
            let application = registration
                .app_class_name()
                .unwrap_or("<resource config>")
                .to_string();
            let index = resolve_listener(&slots, &registration, &application)?;
            let slot = &mut slots[index];

            let context_root = normalize_context_root(registration.context_root());
            if !is_literal_context_root(&context_root) {
                return Err(ServerError::InvalidContextRoot {
                    listener: slot.name.clone(),
                    context_root,
                });
            }
            if slot.context_roots.contains(&context_root) {
                return Err(ServerError::DuplicateContextRoot {
                    listener: slot.name.clone(),
                    context_root,
                });
            }

            let executor = registration
                .executor()
                .or(self.default_executor.as_ref())
                .cloned();
            let mut router = registration.into_resource_config().into_router();
            if let Some(executor) = &executor {
                router = router.layer(middleware::from_fn_with_state(
                    executor.clone(),
                    run_on_executor,
                ));
            }
            slot.mount(&context_root, router);

            tracing::info!(
                application = %application,
                listener = %slot.name,
                context_root = %context_root,
                executor = executor.as_ref().map(SharedExecutor::name).unwrap_or("inline"),
                "mounted application"
            );
        }

        Ok(Server { listeners: slots })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("default_addr", &self.default_addr)
            .field("listeners", &self.listeners)
            .field("default_executor", &self.default_executor)
            .field("application_count", &self.applications.len())
            .finish()
    }
}

fn resolve_listener(
    slots: &[ListenerSlot],
    registration: &ApplicationRegistration,
    application: &str,
) -> ServerResult<usize> {
    let Some(routing_name) = registration.routing_name() else {
        return Ok(0);
    };
    if let Some(index) = slots.iter().position(|slot| slot.name == routing_name) {
        return Ok(index);
    }
    if registration.routing_name_required() {
        return Err(ServerError::RoutingNameNotFound {
            routing_name: routing_name.to_string(),
            application: application.to_string(),
        });
    }
    tracing::warn!(
        application,
        routing_name,
        "no listener for routing name, using the default listener"
    );
    Ok(0)
}

/// Leading slash, no trailing slash, `/` for the root.
fn normalize_context_root(context_root: &str) -> String {
    let trimmed = context_root.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_CONTEXT_ROOT.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Captures (`:id`), wildcards (`*rest`, `{id}`) and empty segments would
/// turn the prefix into a pattern; axum panics on some of them when nesting.
fn is_literal_context_root(context_root: &str) -> bool {
    if context_root == DEFAULT_CONTEXT_ROOT {
        return true;
    }
    if context_root.contains(['{', '}']) {
        return false;
    }
    context_root
        .trim_start_matches('/')
        .split('/')
        .all(|segment| !segment.is_empty() && !segment.starts_with([':', '*']))
}

async fn run_on_executor(
    State(executor): State<SharedExecutor>,
    request: Request,
    next: Next,
) -> Response {
    let (tx, rx) = oneshot::channel();
    executor.spawn(async move {
        let _ = tx.send(next.run(request).await);
    });
    match rx.await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(executor = executor.name(), "executor dropped request");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

struct ListenerSlot {
    name: String,
    addr: SocketAddr,
    router: Router,
    context_roots: Vec<String>,
}

impl ListenerSlot {
    fn new(name: &str, addr: SocketAddr) -> Self {
        Self {
            name: name.to_string(),
            addr,
            router: Router::new(),
            context_roots: Vec::new(),
        }
    }

    fn mount(&mut self, context_root: &str, router: Router) {
        let current = std::mem::take(&mut self.router);
        self.router = if context_root == DEFAULT_CONTEXT_ROOT {
            current.merge(router)
        } else {
            current.nest(context_root, router)
        };
        self.context_roots.push(context_root.to_string());
    }
}

/// Applications mounted on their listeners, ready to be started.
pub struct Server {
    listeners: Vec<ListenerSlot>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn listener_names(&self) -> impl Iterator<Item = &str> {
        self.listeners.iter().map(|slot| slot.name.as_str())
    }

    /// Context roots mounted on `listener`, in registration order.
    pub fn context_roots(&self, listener: &str) -> Option<&[String]> {
        self.listeners
            .iter()
            .find(|slot| slot.name == listener)
            .map(|slot| slot.context_roots.as_slice())
    }

    /// Bind every listener and serve until the returned handle is shut down.
    pub async fn start(self) -> ServerResult<RunningServer> {
        let mut addrs = Vec::with_capacity(self.listeners.len());
        let mut shutdown = Vec::with_capacity(self.listeners.len());

        for slot in self.listeners {
            let listener = TcpListener::bind(slot.addr)
                .await
                .map_err(|source| ServerError::Bind {
                    listener: slot.name.clone(),
                    source,
                })?;
            let addr = listener
                .local_addr()
                .map_err(|source| ServerError::Bind {
                    listener: slot.name.clone(),
                    source,
                })?;
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let name = slot.name.clone();
            let router = slot.router;

            tokio::spawn(async move {
                let result = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    })
                    .await;
                if let Err(error) = result {
                    tracing::warn!(listener = %name, "listener stopped: {error}");
                }
            });

            tracing::info!(listener = %slot.name, %addr, "listening");
            addrs.push((slot.name, addr));
            shutdown.push(shutdown_tx);
        }

        Ok(RunningServer { addrs, shutdown })
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_map();
        for slot in &self.listeners {
            debug.entry(&slot.name, &slot.context_roots);
        }
        debug.finish()
    }
}

/// Handle to a started [`Server`]. Dropping it stops all listeners.
#[derive(Debug)]
pub struct RunningServer {
    addrs: Vec<(String, SocketAddr)>,
    shutdown: Vec<oneshot::Sender<()>>,
}

impl RunningServer {
    pub fn addr(&self, listener: &str) -> Option<SocketAddr> {
        self.addrs
            .iter()
            .find(|(name, _)| name == listener)
            .map(|(_, addr)| *addr)
    }

    /// Bound address of the default listener.
    pub fn default_addr(&self) -> SocketAddr {
        self.addrs[0].1
    }

    pub fn shutdown(&mut self) {
        for sender in self.shutdown.drain(..) {
            let _ = sender.send(());
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
