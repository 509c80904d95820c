//! Embeds firefly-http in an application: serves a directory and exposes a
//! few named handlers.
//!
//! Run with `cargo run --example embedded_server -- ./public 8080`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use firefly_http::{HandlerRegistry, HttpServer, Params, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let document_root = args.next().unwrap_or_else(|| ".".to_string());
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => 8080,
    };

    let config = ServerConfig::new("127.0.0.1", port, document_root).with_max_connections(256);
    let server = HttpServer::new(config);

    // GET /greet?name=Ada
    server
        .register_handler("greet", |params: Params| async move {
            let name = params.get("name").cloned().flatten().unwrap_or_else(|| "world".to_string());
            Ok(format!("hello {name}"))
        })
        .await;

    // POST /echo returns the request body
    server
        .register_handler("echo", |params: Params| async move {
            Ok(params.get("_POST").cloned().flatten().unwrap_or_default())
        })
        .await;

    // GET /hits counts calls across all connections
    let hits = Arc::new(AtomicU64::new(0));
    server
        .register_handler("hits", move |_params: Params| {
            let hits = hits.clone();
            async move { Ok(format!("{}", hits.fetch_add(1, Ordering::SeqCst) + 1)) }
        })
        .await;

    // A second registry, selectable at runtime
    server
        .add_registry(
            HandlerRegistry::new("maintenance")
                .with_handler("greet", |_params: Params| async { Ok("down for maintenance".to_string()) }),
        )
        .await;

    let addr = server.start().await?;
    println!("Serving on http://{addr}, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    server.stop().await;

    Ok(())
}
