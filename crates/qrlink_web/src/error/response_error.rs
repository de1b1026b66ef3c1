use crate::core::Response;
use http::StatusCode;

/// Conversion of an error into an HTTP response
pub trait ResponseError: std::error::Error + Send + Sync {
    /// Defaults to 500 Internal Server Error.
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Message exposed to the client. Server errors hide their cause.
    fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Defaults to a JSON body of the form `{"detail": "..."}`.
    fn error_response(&self) -> Response {
        let body = serde_json::json!({ "detail": self.public_message() });
        Response::json(self.status_code(), &body)
    }
}
