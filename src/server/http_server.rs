//! HTTP server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tokio::sync::{Mutex, Notify, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time;

use crate::parser::{Params, RequestDecoder};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::{HandlerRegistries, HandlerRegistry, InvocationError};
use crate::server::mime::ContentTypes;
use crate::server::response::{write_response, HttpResponse, StatusCode};
use crate::server::router::Router;

/// Pending connections the kernel queues for the listener.
pub const ACCEPT_BACKLOG: u32 = 100;

/// Upper bound on a single accept wait, after which the loop re-checks
/// whether it should keep running.
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept loop of a started server and the signal that stops it.
struct AcceptLoop {
    task: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

/// An HTTP server.
///
/// Serves static assets from the configured document root and calls named
/// handlers from the active registry. `start` returns once the socket is
/// bound; connections are served on the tokio runtime until `stop`.
pub struct HttpServer {
    /// The server configuration.
    pub config: Arc<ServerConfig>,
    content_types: Arc<ContentTypes>,
    registries: Arc<RwLock<HandlerRegistries>>,
    running: Arc<AtomicBool>,
    accept_loop: Mutex<Option<AcceptLoop>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            content_types: Arc::new(ContentTypes::default()),
            registries: Arc::new(RwLock::new(HandlerRegistries::default())),
            running: Arc::new(AtomicBool::new(false)),
            accept_loop: Mutex::new(None),
        }
    }

    /// Replace the extension to content type table.
    pub fn with_content_types(mut self, content_types: ContentTypes) -> Self {
        self.content_types = Arc::new(content_types);
        self
    }

    /// Add a handler registry, replacing one with the same name.
    pub async fn add_registry(&self, registry: HandlerRegistry) {
        self.registries.write().await.add(registry);
    }

    /// Register a handler in the default registry.
    pub async fn register_handler<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<String, InvocationError>> + Send + 'static,
    {
        self.registries.write().await.register(name, handler);
    }

    /// Select which registry dynamic calls are resolved against.
    pub async fn set_handler_registry_name(&self, name: impl Into<String>) {
        let name = name.into();
        info!("Using handler registry {name}");
        self.registries.write().await.set_active(name);
    }

    /// Whether the accept loop is live.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Log the registered handlers.
    async fn display_server_info(&self) {
        let registries = self.registries.read().await;
        info!(
            "Serving {root} (index {index})",
            root = self.config.document_root.display(),
            index = self.config.index_file
        );
        info!("Handler registries (active: {active}):", active = registries.active_name());
        for registry in registries.iter() {
            info!("  {name}: {handlers}", name = registry.name(), handlers = registry.handler_names().join(", "));
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let target = format!("{host}:{port}", host = self.config.host, port = self.config.port);
        let addr = lookup_host((self.config.host.as_str(), self.config.port))
            .await?
            .next()
            .ok_or_else(|| Error::AddrResolve(target))?;

        let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(ACCEPT_BACKLOG)?;

        info!("Server listening on http://{addr}", addr = listener.local_addr()?);
        Ok(listener)
    }

    /// Bind the listener and start accepting connections.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port `0` was requested.
    pub async fn start(&self) -> Result<SocketAddr, Error> {
        let mut accept_loop = self.accept_loop.lock().await;
        if accept_loop.is_some() {
            return Err(Error::AlreadyRunning);
        }
        self.config.validate()?;

        self.display_server_info().await;
        let listener = self.setup_listener().await?;
        let local_addr = listener.local_addr()?;

        let router = Arc::new(Router::new(
            self.config.clone(),
            self.content_types.clone(),
            self.registries.clone(),
        ));
        let limit = self.config.max_connections.map(|max| Arc::new(Semaphore::new(max)));
        let shutdown = Arc::new(Notify::new());

        self.running.store(true, Ordering::SeqCst);
        let task = tokio::spawn(Self::accept_connections(
            listener,
            router,
            limit,
            self.running.clone(),
            shutdown.clone(),
        ));
        *accept_loop = Some(AcceptLoop { task, shutdown });

        Ok(local_addr)
    }

    /// Stop accepting and close the listening socket.
    ///
    /// Connections already being served run until their peers close them.
    pub async fn stop(&self) {
        let Some(accept_loop) = self.accept_loop.lock().await.take() else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        accept_loop.shutdown.notify_one();
        if let Err(e) = accept_loop.task.await {
            error!("Accept loop failed: {e}");
        }
        info!("Server stopped");
    }

    async fn accept_connections(
        listener: TcpListener,
        router: Arc<Router>,
        limit: Option<Arc<Semaphore>>,
        running: Arc<AtomicBool>,
        shutdown: Arc<Notify>,
    ) {
        while running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = shutdown.notified() => break,

                accepted = time::timeout(ACCEPT_TIMEOUT, listener.accept()) => match accepted {
                    Ok(Ok((socket, addr))) => Self::handle_new_connection(socket, addr, router.clone(), limit.as_ref()),
                    Ok(Err(e)) => Self::handle_accept_error(e).await,
                    // Timed out: loop around and re-check the running flag.
                    Err(_) => {}
                },
            }
        }

        running.store(false, Ordering::SeqCst);
        drop(listener);
        info!("Listener closed");
    }

    /// Hand a freshly accepted connection to its own task.
    fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        router: Arc<Router>,
        limit: Option<&Arc<Semaphore>>,
    ) {
        let permit = match limit.map(|semaphore| semaphore.clone().try_acquire_owned()) {
            Some(Ok(permit)) => Some(permit),
            Some(Err(_)) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tokio::spawn(async move {
                    let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                        .with_content_type("text/plain")
                        .with_text("Server is at capacity, please try again later")
                        .with_keep_alive(false);
                    if let Err(e) = write_response(&mut socket, &response).await {
                        debug!("Could not send 503 to {addr}: {e}");
                    }
                });
                return;
            }
            None => None,
        };

        tokio::spawn(async move {
            // The permit is dropped when the task completes, releasing the slot
            let _permit = permit;

            debug!("Accepted connection from {addr}");
            match Self::handle_connection(&mut socket, &router).await {
                Ok(()) => debug!("Connection from {addr} closed"),
                Err(e) => debug!("Connection from {addr} ended: {e}"),
            }
        });
    }

    /// Accept errors never stop the loop.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        // Back off briefly so a persistent error does not spin
        time::sleep(Duration::from_millis(100)).await;
    }

    /// Serve one connection until the peer closes it or an I/O error occurs.
    ///
    /// Each decoded request is routed and answered in order. Rejected
    /// exchanges get no response and leave the connection open.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        router: &Router,
    ) -> Result<(), Error> {
        let config = router.config();
        let mut buf = vec![0; config.read_buffer_size];
        let mut decoder = RequestDecoder::new();

        loop {
            let n = match config.read_timeout() {
                Some(limit) => match time::timeout(limit, socket.read(&mut buf)).await {
                    Ok(read) => read?,
                    Err(_) => {
                        debug!("Connection idle for {limit:?}, closing");
                        return Ok(());
                    }
                },
                None => socket.read(&mut buf).await?,
            };
            if n == 0 {
                return Ok(()); // Connection closed
            }
            decoder.extend(&buf[..n]);

            while let Some(decoded) = decoder.next_request() {
                let request = match decoded {
                    Ok(request) => request,
                    Err(e) => {
                        warn!("Dropping request: {e}");
                        continue;
                    }
                };

                debug!("{} {} {}", request.method, request.target, request.version);
                let response = router.dispatch(&request).await;
                write_response(socket, &response).await?;

                if !response.keep_alive {
                    socket.shutdown().await?;
                    return Ok(());
                }
            }
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(accept_loop) = self.accept_loop.get_mut().take() {
            self.running.store(false, Ordering::SeqCst);
            accept_loop.shutdown.notify_one();
        }
    }
}

/// Start a server for `bind_address:port` serving `document_root`.
///
/// Handlers can be registered on the returned server at any time.
pub async fn start(
    bind_address: impl Into<String>,
    port: u16,
    document_root: impl Into<PathBuf>,
) -> Result<HttpServer, Error> {
    let server = HttpServer::new(ServerConfig::new(bind_address, port, document_root));
    server.start().await?;
    Ok(server)
}
