use super::ResponseError;
use crate::core::Response;

/// Boxed [`ResponseError`] returned by handlers and middleware.
#[derive(Debug)]
pub struct WebError {
    inner: Box<dyn ResponseError>,
}

impl WebError {
    #[track_caller]
    pub fn new<T: ResponseError + 'static>(err: T) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    pub fn as_response_error(&self) -> &dyn ResponseError {
        &*self.inner
    }

    pub fn status_code(&self) -> http::StatusCode {
        self.inner.status_code()
    }

    /// Log the error and render it
    pub fn into_response(self) -> Response {
        let status = self.inner.status_code();
        if status.is_server_error() {
            tracing::error!(status_code = %status, error = %self.inner, "request failed");
        } else {
            tracing::warn!(status_code = %status, error = %self.inner, "request rejected");
        }
        self.inner.error_response()
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

// Lets `?` lift any ResponseError into a WebError.
impl<T: ResponseError + 'static> From<T> for WebError {
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimpleError;
    use http::StatusCode;

    #[test]
    fn client_errors_expose_their_message() {
        let err: WebError =
            SimpleError::new(StatusCode::BAD_REQUEST, "cdc_id must not be empty".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let res = err.into_response();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body["detail"], "cdc_id must not be empty");
    }

    #[test]
    fn server_errors_hide_their_cause() {
        let err = crate::error::internal_error("png writer exploded");
        assert_eq!(err.to_string(), "png writer exploded");

        let res = err.into_response();
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body["detail"], "Internal Server Error");
    }
}
