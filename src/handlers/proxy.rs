//! Proxy relay: the only trust boundary crossing in the system.
//!
//! A request carrying a session token is re-authenticated locally, then
//! re-signed with the store's decrypted Application Password and forwarded
//! to the WooCommerce REST API. The upstream status and body come back
//! verbatim; the session token never leaves this process.

use axum::{
    body::{Body, to_bytes},
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::api::{StoreCredentials, UpstreamRequest, WooApi};
use crate::error::PlazaError;
use crate::router::PlazaState;

/// Cap on relayed JSON bodies.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct ProxyContext {
    pub token: String,
    pub endpoint: String,
    pub method: Method,
    /// Query parameters to pass through; `token` and `endpoint` stripped.
    pub query: Vec<(String, String)>,
    /// JSON body for POST/PUT; `token` stripped.
    pub body: Option<Value>,
}

pub struct ProxyPreprocess(pub ProxyContext);

impl<S> FromRequest<S> for ProxyPreprocess
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();

        let mut token = String::new();
        let mut endpoint = String::new();
        let mut query = Vec::new();
        if let Some(raw) = req.uri().query() {
            for (k, v) in form_urlencoded::parse(raw.as_bytes()) {
                match k.as_ref() {
                    "token" => token = v.into_owned(),
                    "endpoint" => endpoint = v.into_owned(),
                    _ => query.push((k.into_owned(), v.into_owned())),
                }
            }
        }

        let mut body = None;
        if method == Method::POST || method == Method::PUT {
            let bytes = to_bytes(req.into_body(), BODY_LIMIT).await.map_err(|_| {
                PlazaError::Validation("request body too large or unreadable".to_string())
                    .into_response()
            })?;
            if !bytes.is_empty() {
                let value: Value = serde_json::from_slice(&bytes).map_err(|_| {
                    PlazaError::Validation("request body is not valid JSON".to_string())
                        .into_response()
                })?;
                body = Some(value);
            }
        }

        // The token may also arrive in the JSON body; either way it is
        // removed so it never reaches the upstream API.
        if let Some(Value::Object(map)) = body.as_mut()
            && let Some(body_token) = map.remove("token")
            && let Some(s) = body_token.as_str()
        {
            token = s.to_owned();
        }

        Ok(Self(ProxyContext {
            token,
            endpoint,
            method,
            query,
            body,
        }))
    }
}

/// ANY /proxy — validate, resolve credentials, relay, pass through.
pub async fn relay(
    State(state): State<PlazaState>,
    ProxyPreprocess(ctx): ProxyPreprocess,
) -> Result<Response, PlazaError> {
    // Session check comes first; invalid tokens do no further work.
    let user = state.sessions.validate(&ctx.token).await?;

    let Some(store_id) = user.store_id else {
        return Err(PlazaError::NotFound {
            message: "Store not found".to_string(),
            debug: format!("user {} has no store assigned", user.user_id),
        });
    };
    let store = state
        .storage
        .get_store(store_id)
        .await?
        .filter(|s| s.active)
        .ok_or_else(|| PlazaError::NotFound {
            message: "Store not found".to_string(),
            debug: format!("store id: {store_id}"),
        })?;

    // Credential failure classes stay distinct for diagnosis.
    if store.app_password_encrypted.is_empty() {
        return Err(PlazaError::StoreCredentials {
            store_id,
            debug: "store has no Application Password configured".to_string(),
        });
    }
    let app_password = state
        .vault
        .decrypt(&store.app_password_encrypted)
        .map_err(|e| {
            warn!(
                store_id,
                error = %e,
                blob_len = store.app_password_encrypted.len(),
                "could not decrypt Application Password"
            );
            PlazaError::StoreCredentials {
                store_id,
                debug: "could not decrypt the stored Application Password".to_string(),
            }
        })?;
    if app_password.is_empty() {
        return Err(PlazaError::StoreCredentials {
            store_id,
            debug: "decrypted Application Password is empty".to_string(),
        });
    }
    if store.wp_username.is_empty() {
        return Err(PlazaError::StoreCredentials {
            store_id,
            debug: "store has no WordPress username configured".to_string(),
        });
    }

    if ctx.endpoint.is_empty() {
        return Err(PlazaError::Validation("endpoint is required".to_string()));
    }

    debug!(
        user_id = user.user_id,
        store_id,
        method = %ctx.method,
        endpoint = %ctx.endpoint,
        "relaying request"
    );

    let creds = StoreCredentials {
        username: store.wp_username,
        app_password,
    };
    let upstream = WooApi::relay(
        &state.client,
        &creds,
        &store.base_url,
        UpstreamRequest {
            method: ctx.method,
            endpoint: &ctx.endpoint,
            query: &ctx.query,
            body: ctx.body.as_ref(),
        },
        state.upstream_timeout,
    )
    .await?;

    // Pass-through: upstream status and body verbatim, no reshaping.
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
