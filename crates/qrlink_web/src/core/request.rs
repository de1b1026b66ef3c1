use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;

use crate::error::ResponseError;

/// Failure to turn the query string or body into a typed value.
#[derive(Debug, thiserror::Error)]
pub enum RequestParseError {
    #[error("invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResponseError for RequestParseError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

#[derive(Debug)]
pub struct Request {
    pub inner: http::Request<Bytes>,
    pub params: HashMap<String, String>,
}

impl Request {
    /// Build a request for a method and path (with optional query string).
    ///
    /// Panics if `path` is not a valid URI; use [`Request::try_new`] for
    /// untrusted input.
    pub fn new<M: Into<Method>, S: AsRef<str>>(method: M, path: S) -> Self {
        Self::try_new(method, path).expect("valid request uri")
    }

    pub fn try_new<M: Into<Method>, S: AsRef<str>>(
        method: M,
        path: S,
    ) -> Result<Self, http::Error> {
        let inner = http::Request::builder()
            .method(method.into())
            .uri(path.as_ref())
            .body(Bytes::new())?;

        Ok(Self {
            inner,
            params: HashMap::new(),
        })
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.inner.headers_mut().insert(key, value);
        }
        self
    }

    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        *self.inner.body_mut() = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap<HeaderValue> {
        self.inner.headers_mut()
    }

    /// First value of a header as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Deserialize the query string. A missing query string is treated as empty.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, RequestParseError> {
        let raw = self.uri().query().unwrap_or("");
        Ok(serde_urlencoded::from_str(raw)?)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestParseError> {
        Ok(serde_json::from_slice(self.body())?)
    }
}
