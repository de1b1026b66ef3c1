use async_trait::async_trait;
use http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::Middleware;
use crate::core::{Handler, Request, Response};
use crate::error::{SimpleError, WebError};

/// Timeout and size limits applied to every request
#[derive(Clone, Debug)]
pub struct LimitsConfig {
    /// Maximum time to produce a response (default: 30 seconds)
    pub request_timeout: Duration,
    /// Maximum request body size in bytes (default: 64KB)
    pub max_body_size: usize,
    /// Maximum URL path length (default: 2048 characters)
    pub max_path_length: usize,
    /// Maximum number of headers (default: 100)
    pub max_headers: usize,
    /// Maximum size of a single header name plus value (default: 8KB)
    pub max_header_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024,
            max_path_length: 2048,
            max_headers: 100,
            max_header_size: 8 * 1024,
        }
    }
}

impl LimitsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn max_path_length(mut self, length: usize) -> Self {
        self.max_path_length = length;
        self
    }

    pub fn max_headers(mut self, count: usize) -> Self {
        self.max_headers = count;
        self
    }

    pub fn max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }
}

fn reject(status: StatusCode) -> WebError {
    let reason = status.canonical_reason().unwrap_or("Rejected");
    SimpleError::new(status, reason.to_string()).into()
}

/// Rejects oversized requests and bounds handler time
#[derive(Default)]
pub struct LimitsMiddleware {
    config: LimitsConfig,
}

impl LimitsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LimitsConfig) -> Self {
        Self { config }
    }

    fn validate_request(&self, req: &Request) -> Result<(), WebError> {
        if req.path().len() > self.config.max_path_length {
            tracing::warn!(
                length = req.path().len(),
                limit = self.config.max_path_length,
                "request path too long"
            );
            return Err(reject(StatusCode::URI_TOO_LONG));
        }

        if req.headers().len() > self.config.max_headers {
            tracing::warn!(
                count = req.headers().len(),
                limit = self.config.max_headers,
                "too many headers"
            );
            return Err(reject(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
        }

        let oversized = req
            .headers()
            .iter()
            .any(|(name, value)| name.as_str().len() + value.len() > self.config.max_header_size);
        if oversized {
            tracing::warn!(limit = self.config.max_header_size, "header too large");
            return Err(reject(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
        }

        if req.body().len() > self.config.max_body_size {
            tracing::warn!(
                size = req.body().len(),
                limit = self.config.max_body_size,
                "request body too large"
            );
            return Err(reject(StatusCode::PAYLOAD_TOO_LARGE));
        }

        Ok(())
    }
}

#[async_trait]
impl Middleware for LimitsMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        self.validate_request(&req)?;

        match timeout(self.config.request_timeout, next.handle(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.request_timeout.as_millis(),
                    "request timed out"
                );
                Err(reject(StatusCode::REQUEST_TIMEOUT))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Method;

    struct MockHandler {
        delay: Option<Duration>,
    }

    impl MockHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self { delay: None })
        }

        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self { delay: Some(delay) })
        }
    }

    #[async_trait]
    impl Handler for MockHandler {
        async fn handle(&self, _req: Request) -> Result<Response, WebError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(Response::text(StatusCode::OK, "ok"))
        }
    }

    async fn status_of(config: LimitsConfig, req: Request, handler: Arc<MockHandler>) -> u16 {
        let middleware = LimitsMiddleware::with_config(config);
        match middleware.handle(req, handler).await {
            Ok(res) => res.status.as_u16(),
            Err(err) => err.status_code().as_u16(),
        }
    }

    #[tokio::test]
    async fn request_timeout() {
        let config = LimitsConfig::new().request_timeout(Duration::from_millis(50));
        let req = Request::new(Method::GET, "/qr/verificar-cdc");
        let status = status_of(config, req, MockHandler::with_delay(Duration::from_millis(500))).await;
        assert_eq!(status, 408);
    }

    #[tokio::test]
    async fn path_length_limit() {
        let config = LimitsConfig::new().max_path_length(10);
        let req = Request::new(Method::GET, "/qr/verificar-cdc");
        assert_eq!(status_of(config, req, MockHandler::new()).await, 414);
    }

    #[tokio::test]
    async fn body_size_limit() {
        let config = LimitsConfig::new().max_body_size(5);
        let req = Request::new(Method::POST, "/qr/guardar-cdc").with_body(r#"{"cdc_id":"x"}"#);
        assert_eq!(status_of(config, req, MockHandler::new()).await, 413);
    }

    #[tokio::test]
    async fn header_count_and_size_limits() {
        let req = Request::new(Method::GET, "/")
            .header("header1", "value1")
            .header("header2", "value2")
            .header("header3", "value3");
        let config = LimitsConfig::new().max_headers(2);
        assert_eq!(status_of(config, req, MockHandler::new()).await, 431);

        let req = Request::new(Method::GET, "/").header("x-long", "very-long-value");
        let config = LimitsConfig::new().max_header_size(10);
        assert_eq!(status_of(config, req, MockHandler::new()).await, 431);
    }

    #[tokio::test]
    async fn valid_request_passes() {
        let req = Request::new(Method::POST, "/qr/generador").with_body(r#"{"session_id":"s"}"#);
        assert_eq!(status_of(LimitsConfig::new(), req, MockHandler::new()).await, 200);
    }
}
