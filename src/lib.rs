//! A minimal embeddable HTTP server.
//!
//! `firefly-http` is linked into a host application to serve a small set of
//! local pages and assets plus an API surface addressed by name. A request is
//! resolved either to a file under the document root or, when its final path
//! segment carries no known file extension, to a handler registered under that
//! name.
//!
//! # Features
//!
//! - Incremental request decoding that tolerates requests split across reads
//! - Static assets with a text/binary split driven by content type
//! - Named async handlers grouped into switchable registries
//! - One task per connection, with an optional connection limit
//! - Start/stop from the host at any time
//!
//! # Examples
//!
//! ## Serving a directory with a handler
//!
//! ```no_run
//! use firefly_http::{HttpServer, InvocationError, Params, ServerConfig};
//!
//! # async fn run() -> Result<(), firefly_http::ServerError> {
//! let server = HttpServer::new(ServerConfig::new("127.0.0.1", 9000, "./public"));
//!
//! server.register_handler("greet", |params: Params| async move {
//!     let name = params.get("name").cloned().flatten().ok_or("name is required")?;
//!     Ok::<_, InvocationError>(format!("hello {name}"))
//! }).await;
//!
//! let addr = server.start().await?;
//! println!("listening on {addr}");
//! // GET /greet?name=Ada -> "hello Ada"
//! // GET /logo.png       -> ./public/logo.png
//!
//! server.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parsing a request
//!
//! ```
//! use firefly_http::{parse_request, Method};
//!
//! let request = parse_request(b"POST /echo HTTP/1.1\r\nContent-Length: 3\r\n\r\nx=1").unwrap();
//! assert_eq!(request.method, Method::POST);
//! assert_eq!(request.body_text(), "x=1");
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{parse_request, Error as ParserError, HttpRequest, HttpVersion, Method, Params, RequestDecoder};
pub use server::{
    start, Body, ContentTypes, Error as ServerError, Handler, HandlerRegistry, HttpResponse, HttpServer,
    InvocationError, ServerConfig, StatusCode,
};
