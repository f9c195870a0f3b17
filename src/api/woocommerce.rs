//! Stateless WooCommerce REST API caller.
//!
//! Builds `{base_url}/wp-json/wc/v3{endpoint}` requests signed with HTTP
//! Basic Auth from the store's WordPress username and decrypted Application
//! Password. No retries: every failure is reported upward immediately.

use axum::http::Method;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// API root appended to the store's base URL.
const WC_API_ROOT: &str = "/wp-json/wc/v3";

/// Plaintext credentials held only for the duration of one relayed call.
pub struct StoreCredentials {
    pub username: String,
    pub app_password: String,
}

pub struct UpstreamRequest<'a> {
    pub method: Method,
    pub endpoint: &'a str,
    /// Passthrough query parameters; internal control fields already stripped.
    pub query: &'a [(String, String)],
    pub body: Option<&'a Value>,
}

pub struct WooApi;

impl WooApi {
    pub fn build_url(
        base_url: &str,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Url, url::ParseError> {
        let base = base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{WC_API_ROOT}{endpoint}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn relay(
        client: &reqwest::Client,
        creds: &StoreCredentials,
        base_url: &str,
        req: UpstreamRequest<'_>,
        timeout: Duration,
    ) -> Result<reqwest::Response, RelayError> {
        let url = Self::build_url(base_url, req.endpoint, req.query)?;

        let mut builder = client
            .request(req.method, url)
            .basic_auth(&creds.username, Some(&creds.app_password))
            .timeout(timeout);
        if let Some(body) = req.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid store base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}
