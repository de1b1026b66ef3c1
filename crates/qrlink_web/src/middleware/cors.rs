use async_trait::async_trait;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN,
    VARY,
};
use http::{HeaderValue, Method, StatusCode};
use std::sync::Arc;

use super::Middleware;
use crate::core::{Handler, Request, Response};
use crate::error::WebError;

/// Origins allowed to read responses
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// `Access-Control-Allow-Origin: *`
    Any,
    /// Exact origins, echoed back when they match the request `Origin`
    List(Vec<String>),
}

/// Cross-origin policy.
///
/// Credentials are only ever advertised together with an explicit origin
/// list; with [`AllowedOrigins::Any`] the flag is ignored, since browsers
/// reject `*` combined with `Access-Control-Allow-Credentials: true`.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub origins: AllowedOrigins,
    pub allow_credentials: bool,
    pub allow_methods: Vec<Method>,
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: AllowedOrigins::Any,
            allow_credentials: false,
            allow_methods: vec![Method::GET, Method::POST, Method::OPTIONS],
            max_age_secs: None,
        }
    }
}

impl CorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = AllowedOrigins::List(origins.into_iter().map(Into::into).collect());
        self
    }

    pub fn allow_any_origin(mut self) -> Self {
        self.origins = AllowedOrigins::Any;
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    pub fn max_age_secs(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }
}

/// Adds CORS headers to every response and answers every `OPTIONS` request
/// as a preflight with `204 No Content`.
pub struct CorsMiddleware {
    config: CorsConfig,
    methods: HeaderValue,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        let joined = config
            .allow_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let methods = HeaderValue::from_str(&joined)
            .unwrap_or(HeaderValue::from_static("GET, POST, OPTIONS"));
        Self { config, methods }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` if the origin is not allowed.
    fn allow_origin(&self, req: &Request) -> Option<HeaderValue> {
        match &self.config.origins {
            AllowedOrigins::Any => Some(HeaderValue::from_static("*")),
            AllowedOrigins::List(list) => {
                let origin = req.header_str(ORIGIN.as_str())?;
                list.iter()
                    .any(|allowed| allowed == origin)
                    .then(|| HeaderValue::from_str(origin).ok())
                    .flatten()
            }
        }
    }

    fn decorate(&self, res: &mut Response, origin: Option<HeaderValue>) {
        let echoed = matches!(self.config.origins, AllowedOrigins::List(_));
        if echoed {
            res.headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        let Some(origin) = origin else {
            return;
        };
        res.headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if echoed && self.config.allow_credentials {
            res.headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    fn preflight(&self, req: &Request) -> Response {
        let mut res = Response::empty(StatusCode::NO_CONTENT);
        res.headers
            .insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        let requested = req
            .headers()
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or(HeaderValue::from_static("*"));
        res.headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested);
        if let Some(secs) = self.config.max_age_secs {
            res.headers
                .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(secs));
        }
        res
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new(CorsConfig::default())
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    async fn handle(&self, req: Request, next: Arc<dyn Handler>) -> Result<Response, WebError> {
        let origin = self.allow_origin(&req);

        let mut res = if *req.method() == Method::OPTIONS {
            self.preflight(&req)
        } else {
            let mut res = next.handle(req).await.unwrap_or_else(WebError::into_response);
            res.headers
                .insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
            res.headers
                .insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
            res
        };
        self.decorate(&mut res, origin);
        Ok(res)
    }
}
