use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn text<S: Into<String>>(status: StatusCode, body: S) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res.body = Bytes::from(body.into());
        res
    }

    /// Construct an empty response with given status. Does not set content-type.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// Construct a JSON response from any serializable value.
    pub fn json(status: StatusCode, value: impl serde::Serialize) -> Self {
        let mut res = Self::new(status);
        res.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        match serde_json::to_vec(&value) {
            Ok(bytes) => res.body = Bytes::from(bytes),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize JSON response");
                res.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
        res
    }

    pub fn set_header<K, V>(&mut self, k: K, v: V)
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (k.try_into(), v.try_into()) {
            self.headers.insert(key, value);
        }
    }

    pub fn header<K, V>(mut self, k: K, v: V) -> Self
    where
        K: TryInto<http::HeaderName>,
        V: TryInto<HeaderValue>,
    {
        self.set_header(k, v);
        self
    }

    /// Body as UTF-8 text. Mostly useful in tests.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
