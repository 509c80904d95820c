//! Named handlers for dynamic routes.
//!
//! A request whose final path segment has no known file extension is treated
//! as a call to the handler of that name in the active [`HandlerRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::parser::Params;

/// Name of the registry consulted until the host selects another one.
pub const DEFAULT_REGISTRY_NAME: &str = "web_api";

/// Failure reported by a handler. Clients only ever see a 404 for it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvocationError(String);

impl InvocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for InvocationError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for InvocationError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Type alias for a boxed future that returns a handler's textual result.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, InvocationError>> + Send>>;

/// A capability invokable by name with string-keyed parameters.
///
/// Implemented for any `Fn(Params) -> impl Future<Output = Result<String, InvocationError>>`,
/// so async closures register directly.
pub trait Handler: Send + Sync {
    fn invoke(&self, params: Params) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, InvocationError>> + Send + 'static,
{
    fn invoke(&self, params: Params) -> HandlerFuture {
        Box::pin(self(params))
    }
}

/// A named set of handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    name: String,
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("name", &self.name)
            .field("handlers", &self.handler_names())
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind `name` to an async function, replacing any previous binding.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, InvocationError>> + Send + 'static,
    {
        self.insert(name, Arc::new(handler))
    }

    /// Bind `name` to an existing handler object.
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Builder form of [`HandlerRegistry::register`].
    pub fn with_handler<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, InvocationError>> + Send + 'static,
    {
        self.register(name, handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Registered handler names, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Every registry a server knows plus the name of the one in use.
#[derive(Debug, Clone)]
pub struct HandlerRegistries {
    registries: HashMap<String, HandlerRegistry>,
    active: String,
}

impl Default for HandlerRegistries {
    fn default() -> Self {
        let default = HandlerRegistry::new(DEFAULT_REGISTRY_NAME);
        Self {
            registries: HashMap::from([(DEFAULT_REGISTRY_NAME.to_string(), default)]),
            active: DEFAULT_REGISTRY_NAME.to_string(),
        }
    }
}

impl HandlerRegistries {
    /// Add a registry, replacing one with the same name.
    pub fn add(&mut self, registry: HandlerRegistry) {
        self.registries.insert(registry.name().to_string(), registry);
    }

    /// Register a handler in the default registry.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, InvocationError>> + Send + 'static,
    {
        self.registries
            .entry(DEFAULT_REGISTRY_NAME.to_string())
            .or_insert_with(|| HandlerRegistry::new(DEFAULT_REGISTRY_NAME))
            .register(name, handler);
    }

    /// Select the registry consulted for dynamic calls. The name need not be
    /// known yet; until it is, every dynamic call resolves to nothing.
    pub fn set_active(&mut self, name: impl Into<String>) {
        self.active = name.into();
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> Option<&HandlerRegistry> {
        self.registries.get(&self.active)
    }

    /// Look `name` up in the active registry.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.active()?.get(name)
    }

    /// All registries, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerRegistry> {
        let mut registries: Vec<&HandlerRegistry> = self.registries.values().collect();
        registries.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        registries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let registry = HandlerRegistry::new("api").with_handler("greet", |params: Params| async move {
            let name = params.get("name").cloned().flatten().unwrap_or_default();
            Ok(format!("hello {name}"))
        });

        let handler = registry.get("greet").unwrap();
        let result = handler.invoke(params(&[("name", "Ada")])).await.unwrap();
        assert_eq!(result, "hello Ada");
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_failing_handler() {
        let registry = HandlerRegistry::new("api")
            .with_handler("fail", |_params: Params| async { Err(InvocationError::new("database offline")) });

        let err = registry.get("fail").unwrap().invoke(Params::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "database offline");
    }

    struct Uptime;

    impl Handler for Uptime {
        fn invoke(&self, _params: Params) -> HandlerFuture {
            Box::pin(async { Ok("42s".to_string()) })
        }
    }

    #[tokio::test]
    async fn test_trait_object_handler() {
        let mut registry = HandlerRegistry::new("api");
        registry.insert("uptime", Arc::new(Uptime));
        let result = registry.get("uptime").unwrap().invoke(Params::new()).await.unwrap();
        assert_eq!(result, "42s");
    }

    #[test]
    fn test_registry_selection() {
        let mut registries = HandlerRegistries::default();
        registries.register("status", |_params: Params| async { Ok("default".to_string()) });
        registries.add(
            HandlerRegistry::new("admin").with_handler("users", |_params: Params| async { Ok("admin".to_string()) }),
        );

        assert_eq!(registries.active_name(), DEFAULT_REGISTRY_NAME);
        assert!(registries.resolve("status").is_some());
        assert!(registries.resolve("users").is_none());

        registries.set_active("admin");
        assert!(registries.resolve("status").is_none());
        assert!(registries.resolve("users").is_some());

        registries.set_active("unknown");
        assert!(registries.active().is_none());
        assert!(registries.resolve("users").is_none());

        let names: Vec<&str> = registries.iter().map(HandlerRegistry::name).collect();
        assert_eq!(names, vec!["admin", DEFAULT_REGISTRY_NAME]);
    }

    #[test]
    fn test_handler_names_sorted() {
        let mut registry = HandlerRegistry::new("api");
        registry
            .register("zeta", |_params: Params| async { Ok(String::new()) })
            .register("alpha", |_params: Params| async { Ok(String::new()) });
        assert_eq!(registry.handler_names(), vec!["alpha", "zeta"]);
        assert_eq!(registry.len(), 2);
    }
}
