//! Browser-facing CORS handling, evaluated once per request at the router
//! boundary. Preflight OPTIONS requests are answered here and never reach a
//! handler.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::router::PlazaState;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_any: bool,
}

impl CorsPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        let allow_any = origins.iter().any(|o| o == "*");
        Self { origins, allow_any }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when the request
    /// origin is not allowed (no header is emitted at all).
    pub fn allow_value(&self, origin: Option<&str>) -> Option<String> {
        if self.allow_any {
            return Some("*".to_string());
        }
        let origin = origin?;
        self.origins
            .iter()
            .any(|o| o == origin)
            .then(|| origin.to_string())
    }
}

pub async fn cors_middleware(
    State(state): State<PlazaState>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let preflight = req.method() == Method::OPTIONS;

    let mut resp = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    if let Some(allowed) = state.cors.allow_value(origin.as_deref())
        && let Ok(value) = HeaderValue::from_str(&allowed)
    {
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        if preflight {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            );
        }
    }

    resp
}
