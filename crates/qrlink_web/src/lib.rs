pub mod core;
pub mod error;
pub mod middleware;

pub use crate::core::*;
pub use error::{ResponseError, WebError};
pub use http::StatusCode;
pub use middleware::*;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::Response as HttpResponse;
use std::collections::HashMap;
use std::sync::Arc;

use pingora::protocols::http::ServerSession;
use pingora::server::ShutdownWatch;
use pingora_core::apps::{HttpPersistentSettings, HttpServerApp, HttpServerOptions, ReusedHttpStream};
use pingora_core::services::listening::Service;
use pingora_http::ResponseHeader;

/// Upper bound on buffered request bodies when no limit is configured.
const DEFAULT_BODY_READ_LIMIT: usize = 1024 * 1024;

/// Router plus middleware, served by Pingora.
pub struct App {
    router: Router,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    body_read_limit: usize,
}

struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn handle(&self, _req: Request) -> Result<Response, WebError> {
        Ok(Response::text(StatusCode::NOT_FOUND, "Not Found"))
    }
}

/// Answers a path that exists under other methods
struct MethodNotAllowed {
    allow: String,
}

#[async_trait]
impl Handler for MethodNotAllowed {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        let res = if *req.method() == Method::OPTIONS {
            Response::empty(StatusCode::NO_CONTENT)
        } else {
            Response::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        };
        Ok(res.header(http::header::ALLOW, self.allow.as_str()))
    }
}

impl App {
    /// Builds an app over `router` with the request-id middleware installed outermost.
    pub fn new(router: Router) -> Self {
        let mut app = Self {
            router,
            middlewares: Vec::new(),
            body_read_limit: DEFAULT_BODY_READ_LIMIT,
        };
        app.use_middleware(RequestId::default());
        app
    }

    /// Appends a middleware. Earlier registrations wrap later ones.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Stop buffering a request body after `limit` bytes. Keep it at or above
    /// the limits middleware's body size so oversized bodies are still detected.
    pub fn set_body_read_limit(&mut self, limit: usize) {
        self.body_read_limit = limit;
    }

    fn resolve(&self, req: &Request) -> (Arc<dyn Handler>, HashMap<String, String>) {
        if let Some(found) = self.router.find(req.method(), req.path()) {
            return found;
        }

        let mut allowed = self.router.allowed_methods(req.path());
        if allowed.is_empty() {
            return (Arc::new(NotFound), HashMap::new());
        }
        allowed.push(Method::OPTIONS.as_str().to_string());
        allowed.sort();
        allowed.dedup();
        let handler = MethodNotAllowed {
            allow: allowed.join(", "),
        };
        (Arc::new(handler), HashMap::new())
    }

    /// Handle a request end-to-end through middlewares and the router.
    pub async fn handle(&self, req: Request) -> Response {
        let (handler, params) = self.resolve(&req);
        let entry = compose(&self.middlewares, handler);

        let mut response = entry
            .handle(req.with_params(params))
            .await
            .unwrap_or_else(WebError::into_response);

        Self::finalize_response_headers(&mut response);
        response
    }

    fn finalize_response_headers(response: &mut Response) {
        if response.headers.contains_key(http::header::CONTENT_LENGTH) {
            return;
        }
        response.headers.insert(
            http::header::CONTENT_LENGTH,
            http::HeaderValue::from(response.body.len()),
        );
    }

    /// Wrap the app in a Pingora listening service.
    pub fn to_service(self, name: &str) -> Service<App> {
        Service::new(name.to_string(), self)
    }

    /// Read the whole body, stopping once it exceeds the read limit.
    async fn read_body(&self, http: &mut ServerSession) -> Option<Bytes> {
        let mut buf = BytesMut::new();
        loop {
            match http.read_request_body().await {
                Ok(Some(chunk)) => {
                    buf.extend_from_slice(&chunk);
                    if buf.len() > self.body_read_limit {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read request body");
                    return None;
                }
            }
        }
        Some(buf.freeze())
    }
}

#[async_trait]
impl HttpServerApp for App {
    async fn process_new_http(
        self: &Arc<Self>,
        mut http: ServerSession,
        shutdown: &ShutdownWatch,
    ) -> Option<ReusedHttpStream> {
        if !(http.read_request().await.ok()?) {
            return None;
        }
        if *shutdown.borrow() {
            http.set_keepalive(None);
        } else {
            http.set_keepalive(Some(60));
        }

        let reqh = http.req_header();
        let path = String::from_utf8_lossy(reqh.raw_path()).to_string();
        let is_head = reqh.method == Method::HEAD;

        let mut req = match Request::try_new(reqh.method.clone(), &path) {
            Ok(req) => req,
            Err(err) => {
                tracing::warn!(error = %err, "rejecting request with invalid uri");
                return None;
            }
        };
        for (name, value) in reqh.headers.iter() {
            req.headers_mut().append(name.clone(), value.clone());
        }

        if !is_head {
            let has_te = req.headers().contains_key(http::header::TRANSFER_ENCODING);
            let has_len = req
                .header_str(http::header::CONTENT_LENGTH.as_str())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0)
                > 0;
            if has_te || has_len {
                let body = self.read_body(&mut http).await?;
                req = req.with_body(body);
            }
        }

        let res = self.handle(req).await;

        let mut builder = HttpResponse::builder().status(res.status);
        for (k, v) in res.headers.iter() {
            builder = builder.header(k, v);
        }
        let parts = match builder.body(()) {
            Ok(built) => built.into_parts().0,
            Err(err) => {
                tracing::error!(error = %err, "failed to build response header");
                return None;
            }
        };
        let resp_header: ResponseHeader = parts.into();
        if http
            .write_response_header(Box::new(resp_header))
            .await
            .is_err()
        {
            return None;
        }

        if !is_head {
            let _ = http.write_response_body(res.body, true).await;
        }

        let persistent_settings = HttpPersistentSettings::for_session(&http);
        match http.finish().await {
            Ok(c) => c.map(|s| ReusedHttpStream::new(s, Some(persistent_settings))),
            Err(_) => None,
        }
    }

    fn h2_options(&self) -> Option<pingora::protocols::http::v2::server::H2Options> {
        None
    }

    fn server_options(&self) -> Option<&HttpServerOptions> {
        None
    }
}
