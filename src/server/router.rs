//! Request routing: static asset or named handler.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use percent_encoding::percent_decode_str;
use tokio::sync::RwLock;
use url::Url;

use crate::parser::{HttpRequest, Method, Params};
use crate::server::config::ServerConfig;
use crate::server::handler::HandlerRegistries;
use crate::server::mime::{ContentTypes, FALLBACK_CONTENT_TYPE};
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::static_files::StaticFiles;

/// Parameter key carrying a POST body into a handler call.
pub const POST_BODY_PARAM: &str = "_POST";

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRoute {
    /// A file under the document root.
    StaticAsset { path: PathBuf, content_type: String },
    /// A call to the named handler in the active registry.
    DynamicCall { handler_name: String, params: Params },
    NotFound,
}

/// Maps requests to responses.
///
/// Holds only shared read-only state and the handler registries; everything
/// about the request being served lives in the call.
pub struct Router {
    config: Arc<ServerConfig>,
    content_types: Arc<ContentTypes>,
    static_files: StaticFiles,
    registries: Arc<RwLock<HandlerRegistries>>,
}

impl Router {
    pub fn new(
        config: Arc<ServerConfig>,
        content_types: Arc<ContentTypes>,
        registries: Arc<RwLock<HandlerRegistries>>,
    ) -> Self {
        let static_files = StaticFiles::new(config.document_root.clone());
        Self {
            config,
            content_types,
            static_files,
            registries,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Decide how `request` is served.
    pub fn resolve(&self, request: &HttpRequest) -> ResolvedRoute {
        if request.path == "/" {
            return ResolvedRoute::StaticAsset {
                path: self.config.document_root.join(&self.config.index_file),
                content_type: "text/html".to_string(),
            };
        }

        let Ok(url) = Url::parse(&format!("http://localhost{}", request.target)) else {
            debug!("Unparseable target {}", request.target);
            return ResolvedRoute::NotFound;
        };

        let segments: Vec<String> = url
            .path()
            .split('/')
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        let name = match segments.as_slice() {
            [_, .., last] if !last.is_empty() => last.clone(),
            _ => return ResolvedRoute::NotFound,
        };

        // A name mapped to the fallback type is a handler name, even when
        // the table lists its extension explicitly.
        match self.content_types.lookup(&name).filter(|&content_type| content_type != FALLBACK_CONTENT_TYPE) {
            Some(content_type) => {
                if segments.iter().any(|s| s == ".." || s.contains(['/', '\\'])) {
                    return ResolvedRoute::NotFound;
                }
                let relative: PathBuf = segments.iter().filter(|s| !s.is_empty()).collect();
                ResolvedRoute::StaticAsset {
                    path: self.config.document_root.join(relative),
                    content_type: content_type.to_string(),
                }
            }
            None => {
                let mut params = request.query_params.clone();
                if request.method == Method::POST {
                    params.insert(POST_BODY_PARAM.to_string(), Some(request.body_text()));
                }
                ResolvedRoute::DynamicCall {
                    handler_name: name,
                    params,
                }
            }
        }
    }

    /// Produce the response for `request`.
    pub async fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        let response = match self.resolve(request) {
            ResolvedRoute::StaticAsset { path, content_type } => {
                match self.static_files.read(&path, &content_type).await {
                    Some(body) => HttpResponse::new(StatusCode::Ok)
                        .with_content_type(content_type)
                        .with_body(body),
                    None => HttpResponse::not_found(),
                }
            }
            ResolvedRoute::DynamicCall { handler_name, params } => {
                match self.invoke(&handler_name, params).await {
                    Some(text) => HttpResponse::new(StatusCode::Ok)
                        .with_content_type(FALLBACK_CONTENT_TYPE)
                        .with_text(text),
                    None => HttpResponse::not_found(),
                }
            }
            ResolvedRoute::NotFound => HttpResponse::not_found(),
        };

        response.with_keep_alive(request.keep_alive())
    }

    /// Call the handler `name` in the active registry.
    ///
    /// An unknown name, a handler error and a handler panic all come back as
    /// `None`.
    pub async fn invoke(&self, name: &str, params: Params) -> Option<String> {
        let handler = {
            let registries = self.registries.read().await;
            let handler = registries.resolve(name);
            if handler.is_none() {
                debug!("No handler {name} in registry {}", registries.active_name());
            }
            handler?
        };

        debug!("Invoking handler {name}");
        // Spawned so a panicking handler takes down only its own task.
        match tokio::spawn(handler.invoke(params)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!("Handler {name} failed: {e}");
                None
            }
            Err(e) => {
                warn!("Handler {name} aborted: {e}");
                None
            }
        }
    }
}
