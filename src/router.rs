use axum::{
    Router, middleware,
    routing::{any, get, post},
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::PlazaStorage;
use crate::error::PlazaError;
use crate::handlers::{admin, auth, proxy};
use crate::middleware::{CorsPolicy, cors_middleware};
use crate::session::SessionStore;
use crate::vault::CredentialVault;

/// Shared application state, built once in `main` and passed to every
/// handler via axum `State`. No ambient globals.
#[derive(Clone)]
pub struct PlazaState {
    pub storage: PlazaStorage,
    pub sessions: SessionStore,
    pub vault: Arc<CredentialVault>,
    pub client: reqwest::Client,
    pub cors: Arc<CorsPolicy>,
    pub upstream_timeout: Duration,
}

impl PlazaState {
    pub fn new(
        storage: PlazaStorage,
        vault: CredentialVault,
        cfg: &Config,
    ) -> Result<Self, PlazaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.upstream_timeout_secs))
            .build()?;
        let sessions = SessionStore::new(storage.clone(), cfg.session_ttl_hours);
        Ok(Self {
            storage,
            sessions,
            vault: Arc::new(vault),
            client,
            cors: Arc::new(CorsPolicy::new(cfg.origins())),
            upstream_timeout: Duration::from_secs(cfg.upstream_timeout_secs),
        })
    }
}

pub fn plaza_router(state: PlazaState) -> Router {
    Router::new()
        .route("/auth", post(auth::login))
        .route("/cambiar-password", post(auth::change_password))
        .route("/proxy", any(proxy::relay))
        .route(
            "/admin/tiendas",
            get(admin::stores_query).post(admin::stores_upsert),
        )
        .route(
            "/admin/usuarios",
            get(admin::users_query).post(admin::users_upsert),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors_middleware,
        ))
        .with_state(state)
}
