//! HTTP server implementation for firefly-http.
//!
//! The listener hands every accepted connection to its own task, which decodes
//! requests, routes each one to a static asset or a named handler, and writes
//! the response back.

mod response;
mod config;
mod error;
mod handler;
mod mime;
mod router;
mod static_files;
mod http_server;

// Re-export public items
pub use response::{write_response, Body, HttpResponse, StatusCode, NOT_FOUND_PAGE, SERVER_NAME};
pub use config::{ServerConfig, DEFAULT_INDEX_FILE, DEFAULT_READ_BUFFER_SIZE};
pub use error::Error;
pub use handler::{Handler, HandlerFuture, HandlerRegistries, HandlerRegistry, InvocationError, DEFAULT_REGISTRY_NAME};
pub use mime::{is_binary, ContentTypes, BINARY_CONTENT_TYPES, FALLBACK_CONTENT_TYPE};
pub use router::{ResolvedRoute, Router, POST_BODY_PARAM};
pub use static_files::StaticFiles;
pub use http_server::{start, HttpServer, ACCEPT_BACKLOG, ACCEPT_TIMEOUT};
