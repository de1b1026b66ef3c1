use crate::core::{Method, Request, Response};
use crate::error::WebError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process the request and return a response or error
    async fn handle(&self, req: Request) -> Result<Response, WebError>;
}

/// Adapter for plain closures returning `Result`
pub struct HandlerFn<F> {
    closure: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
{
    pub fn new(closure: F) -> Self {
        Self { closure }
    }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
{
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        (self.closure)(req)
    }
}

pub struct Router {
    by_method: HashMap<Method, matchit::Router<Arc<dyn Handler>>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            by_method: HashMap::new(),
        }
    }

    /// Register a route. Panics on a conflicting or malformed pattern, which is
    /// a programming error caught at startup.
    pub fn add<S: Into<String>>(&mut self, method: Method, path: S, handler: Arc<dyn Handler>) {
        let path = path.into();
        let r = self.by_method.entry(method.clone()).or_default();
        if let Err(err) = r.insert(path.clone(), handler) {
            panic!("invalid route {method} {path}: {err}");
        }
    }

    pub fn get<S: Into<String>>(&mut self, path: S, handler: Arc<dyn Handler>) {
        self.add(Method::GET, path, handler)
    }

    pub fn get_fn<S, F>(&mut self, path: S, handler: F)
    where
        S: Into<String>,
        F: Fn(Request) -> Result<Response, WebError> + Send + Sync + 'static,
    {
        self.add(Method::GET, path, Arc::new(HandlerFn::new(handler)))
    }

    pub fn post<S: Into<String>>(&mut self, path: S, handler: Arc<dyn Handler>) {
        self.add(Method::POST, path, handler)
    }

    pub fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        if let Some(found) = self.lookup(method, path) {
            return Some(found);
        }

        // HEAD falls back to GET when no explicit HEAD route exists
        if *method == Method::HEAD {
            return self.lookup(&Method::GET, path);
        }

        None
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<dyn Handler>, HashMap<String, String>)> {
        let m = self.by_method.get(method)?.at(path).ok()?;
        let params = m
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((Arc::clone(m.value), params))
    }

    /// Methods registered for `path`, sorted, for `Allow` headers.
    pub fn allowed_methods(&self, path: &str) -> Vec<String> {
        let mut methods: Vec<String> = self
            .by_method
            .iter()
            .filter(|(_, r)| r.at(path).is_ok())
            .map(|(m, _)| m.as_str().to_string())
            .collect();
        methods.sort();
        methods
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
