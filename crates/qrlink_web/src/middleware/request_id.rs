use crate::{
    core::{Handler, Request, Response},
    error::WebError,
    middleware::Middleware,
};
use http::HeaderValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hex timestamp plus a process-wide counter. Unique within one process.
pub fn generate() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let c = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", ts, c)
}

/// Reuses an incoming `x-request-id` or assigns one, and echoes it on the response.
#[derive(Clone)]
pub struct RequestId {
    header: &'static str,
}

impl RequestId {
    pub fn new() -> Self {
        Self {
            header: REQUEST_ID_HEADER,
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Middleware for RequestId {
    async fn handle(&self, mut req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let incoming = req
            .header_str(self.header)
            .filter(|s| !s.is_empty())
            .and_then(|s| HeaderValue::from_str(s).ok());
        let value = match incoming {
            Some(v) => v,
            // generated ids are plain ASCII hex
            None => HeaderValue::from_str(&generate()).unwrap_or(HeaderValue::from_static("-")),
        };

        req.headers_mut().insert(self.header, value.clone());

        let mut res = next.handle(req).await.unwrap_or_else(WebError::into_response);
        if !res.headers.contains_key(self.header) {
            res.headers.insert(self.header, value);
        }
        Ok(res)
    }
}
