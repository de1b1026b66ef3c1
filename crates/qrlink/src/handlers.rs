//! HTTP handlers for the three `/qr` endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use qrlink_web::{Handler, Request, Response, StatusCode, WebError};
use serde::{Deserialize, Serialize};

use crate::encoder::VisualEncoder;
use crate::error::normalize_session;
use crate::identifier::{IdentifierSource, QrId};
use crate::link::pairing_url;
use crate::store::{Association, AssociationKey, CredentialStore};

#[derive(Debug, Deserialize)]
pub struct GenerateQrRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQrResponse {
    /// Base64 PNG
    pub qr: String,
    pub url: String,
    pub qr_id: QrId,
}

#[derive(Debug, Deserialize)]
pub struct StoreCdcRequest {
    pub qr_id: QrId,
    pub cdc_id: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCdcResponse {
    pub status: String,
    pub message: String,
    pub qr_id: QrId,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCdcQuery {
    pub qr_id: QrId,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyCdcResponse {
    pub cdc_id: Option<String>,
    pub found: bool,
    pub qr_id: QrId,
}

/// `POST /qr/generador`: issue an identifier and a QR code linking to it.
pub struct GenerateQrHandler {
    ids: Arc<dyn IdentifierSource>,
    encoder: Arc<dyn VisualEncoder>,
    base_url: String,
}

impl GenerateQrHandler {
    pub fn new(
        ids: Arc<dyn IdentifierSource>,
        encoder: Arc<dyn VisualEncoder>,
        base_url: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            ids,
            encoder,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Handler for GenerateQrHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        let body: GenerateQrRequest = req.json()?;
        let session_id = normalize_session(&body.session_id)?;

        let qr_id = self.ids.next_id();
        let url = pairing_url(&self.base_url, qr_id, session_id);
        let png = self.encoder.encode_png(&url)?;
        tracing::info!(%qr_id, png_bytes = png.len(), "issued QR code");

        Ok(Response::json(
            StatusCode::OK,
            GenerateQrResponse {
                qr: STANDARD.encode(&png),
                url,
                qr_id,
            },
        ))
    }
}

/// `POST /qr/guardar-cdc`: attach a CDC to a `(qr_id, session_id)` pair.
pub struct StoreCdcHandler {
    store: Arc<dyn CredentialStore>,
}

impl StoreCdcHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

#[async_trait]
impl Handler for StoreCdcHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        let body: StoreCdcRequest = req.json()?;
        let association = Association::new(body.qr_id, &body.session_id, &body.cdc_id)?;

        let message = format!("CDC '{}' saved", association.credential);
        let session_id = association.key.session_id().to_string();
        let replaced = self.store.store(association).is_some();
        tracing::info!(qr_id = %body.qr_id, replaced, "stored CDC");

        Ok(Response::json(
            StatusCode::OK,
            StoreCdcResponse {
                status: "ok".to_string(),
                message,
                qr_id: body.qr_id,
                session_id,
            },
        ))
    }
}

/// `GET /qr/verificar-cdc`: report the CDC stored for a pair, if any.
pub struct VerifyCdcHandler {
    store: Arc<dyn CredentialStore>,
}

impl VerifyCdcHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

#[async_trait]
impl Handler for VerifyCdcHandler {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        let query: VerifyCdcQuery = req.query()?;
        let key = AssociationKey::new(query.qr_id, &query.session_id);
        let cdc_id = self.store.lookup(&key);
        let found = cdc_id.is_some();
        tracing::debug!(qr_id = %query.qr_id, found, "looked up CDC");

        Ok(Response::json(
            StatusCode::OK,
            VerifyCdcResponse {
                cdc_id,
                found,
                qr_id: query.qr_id,
            },
        ))
    }
}
