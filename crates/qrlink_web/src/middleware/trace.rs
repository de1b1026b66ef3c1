use crate::core::Handler;
use crate::{
    core::{Request, Response},
    error::WebError,
    middleware::Middleware,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Instrument, info};

use super::request_id::REQUEST_ID_HEADER;

/// Opens one span per request carrying request_id, method, path, status and latency.
#[derive(Clone, Default)]
pub struct TracingMiddleware;

impl TracingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let span = tracing::info_span!(
            "request",
            request_id = req.header_str(REQUEST_ID_HEADER).unwrap_or(""),
            method = req.method().as_str(),
            path = req.path(),
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        );
        let span_for_record = span.clone();

        async move {
            info!("request started");
            let start_time = std::time::Instant::now();

            // render errors here so the span records the status actually sent
            let res = next.handle(req).await.unwrap_or_else(WebError::into_response);

            span_for_record.record("status", res.status.as_u16());
            span_for_record.record("latency_ms", start_time.elapsed().as_millis());
            info!("request completed");

            Ok(res)
        }
        .instrument(span)
        .await
    }
}
