//! # qrlink
//!
//! A small pairing service. A desktop client asks for a QR code bound to its
//! session; a phone scans it and posts a CDC for that `(qr_id, session_id)`
//! pair; the desktop client polls until the CDC shows up.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /qr/generador` | issue `qr_id`, link and base64 PNG |
//! | `POST /qr/guardar-cdc` | store a CDC for a pair |
//! | `GET /qr/verificar-cdc` | look a CDC up |
//! | `GET /health` | liveness and association count |
//! | `OPTIONS *` | CORS preflight |
//!
//! ```rust,no_run
//! use qrlink::{Components, build_app, config::ServiceConfig};
//!
//! let config = ServiceConfig::new().listen("127.0.0.1:8080");
//! let app = build_app(&config, Components::default());
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod identifier;
pub mod link;
pub mod store;

use std::sync::Arc;

use qrlink_web::{
    App, CorsMiddleware, LimitsMiddleware, PanicRecoveryMiddleware, Response, Router, StatusCode,
    TracingMiddleware,
};

use crate::config::ServiceConfig;
use crate::encoder::{QrPngEncoder, VisualEncoder};
use crate::handlers::{GenerateQrHandler, StoreCdcHandler, VerifyCdcHandler};
use crate::identifier::{IdentifierSource, RandomIdentifier};
use crate::store::{CredentialStore, MemoryStore};

/// The collaborators the handlers are built from.
#[derive(Clone)]
pub struct Components {
    pub ids: Arc<dyn IdentifierSource>,
    pub encoder: Arc<dyn VisualEncoder>,
    pub store: Arc<dyn CredentialStore>,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            ids: Arc::new(RandomIdentifier),
            encoder: Arc::new(QrPngEncoder::default()),
            store: Arc::new(MemoryStore::new()),
        }
    }
}

impl Components {
    pub fn with_ids(mut self, ids: Arc<dyn IdentifierSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn VisualEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }
}

pub fn router(config: &ServiceConfig, components: &Components) -> Router {
    let mut router = Router::new();
    router.post(
        "/qr/generador",
        GenerateQrHandler::new(
            Arc::clone(&components.ids),
            Arc::clone(&components.encoder),
            config.base_url.clone(),
        ),
    );
    router.post(
        "/qr/guardar-cdc",
        StoreCdcHandler::new(Arc::clone(&components.store)),
    );
    router.get(
        "/qr/verificar-cdc",
        VerifyCdcHandler::new(Arc::clone(&components.store)),
    );

    let store = Arc::clone(&components.store);
    router.get_fn("/health", move |_req| {
        Ok(Response::json(
            StatusCode::OK,
            serde_json::json!({ "status": "ok", "associations": store.len() }),
        ))
    });
    router
}

/// Router plus the middleware stack, outermost first: request id, tracing,
/// CORS, panic recovery, limits.
pub fn build_app(config: &ServiceConfig, components: Components) -> App {
    let mut app = App::new(router(config, &components));
    app.set_body_read_limit(config.limits.max_body_size.saturating_add(1));
    app.use_middleware(TracingMiddleware::new());
    app.use_middleware(CorsMiddleware::new(config.cors.clone()));
    app.use_middleware(PanicRecoveryMiddleware::new());
    app.use_middleware(LimitsMiddleware::with_config(config.limits.clone()));
    app
}
