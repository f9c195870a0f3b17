//! Admin CRUD surfaces for stores and users.
//!
//! Plain database CRUD, `action`-dispatched like the dashboard expects.
//! Domain-level failures ("store not found", "store has users") come back as
//! `{"success": false, "error": ...}` with a 200 status; only transport and
//! server faults use HTTP error codes. The encrypted credential and the
//! password hash never leave the server.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::db::StorePublic;
use crate::error::PlazaError;
use crate::handlers::MIN_PASSWORD_LEN;
use crate::router::PlazaState;

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub id: i64,
}

/// GET /admin/tiendas?action=listar|obtener|eliminar
pub async fn stores_query(
    State(state): State<PlazaState>,
    Query(q): Query<ActionQuery>,
) -> Result<Json<Value>, PlazaError> {
    match q.action.as_str() {
        "listar" => {
            let stores: Vec<StorePublic> = state
                .storage
                .list_stores()
                .await?
                .into_iter()
                .map(Into::into)
                .collect();
            Ok(Json(json!({ "success": true, "tiendas": stores })))
        }
        "obtener" => match state.storage.get_store(q.id).await? {
            Some(store) => Ok(Json(
                json!({ "success": true, "tienda": StorePublic::from(store) }),
            )),
            None => Ok(Json(json!({ "success": false, "error": "store not found" }))),
        },
        "eliminar" => {
            let users = state.storage.user_count_for_store(q.id).await?;
            if users > 0 {
                return Ok(Json(json!({
                    "success": false,
                    "error": "cannot delete: store has users assigned",
                })));
            }
            state.storage.delete_store(q.id).await?;
            info!(store_id = q.id, "store deleted");
            Ok(Json(json!({ "success": true })))
        }
        _ => Err(PlazaError::Validation("unknown action".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreUpsert {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub wp_user: String,
    #[serde(default)]
    pub app_password: String,
}

/// POST /admin/tiendas — create (id absent/0) or update.
pub async fn stores_upsert(
    State(state): State<PlazaState>,
    Json(input): Json<StoreUpsert>,
) -> Result<Json<Value>, PlazaError> {
    let name = input.name.trim();
    let url = input.url.trim().trim_end_matches('/');
    let wp_user = input.wp_user.trim();
    // WordPress displays Application Passwords with spaces; strip them.
    let app_password: String = input.app_password.chars().filter(|c| *c != ' ').collect();

    if name.is_empty() || url.is_empty() || wp_user.is_empty() {
        return Ok(Json(json!({
            "success": false,
            "error": "name, url and wp_user are required",
        })));
    }

    if input.id > 0 {
        // Empty password on update keeps the stored ciphertext.
        let blob = match app_password.is_empty() {
            true => None,
            false => Some(state.vault.encrypt(&app_password)?),
        };
        state
            .storage
            .update_store(input.id, name, url, wp_user, blob.as_deref())
            .await?;
        info!(store_id = input.id, "store updated");
        Ok(Json(json!({ "success": true, "id": input.id })))
    } else {
        if app_password.is_empty() {
            return Ok(Json(json!({
                "success": false,
                "error": "app_password is required for new stores",
            })));
        }
        let blob = state.vault.encrypt(&app_password)?;
        let id = state.storage.insert_store(name, url, wp_user, &blob).await?;
        info!(store_id = id, "store created");
        Ok(Json(json!({ "success": true, "id": id })))
    }
}

/// GET /admin/usuarios?action=listar|obtener|eliminar
pub async fn users_query(
    State(state): State<PlazaState>,
    Query(q): Query<ActionQuery>,
) -> Result<Json<Value>, PlazaError> {
    match q.action.as_str() {
        "listar" => {
            let users = state.storage.list_users().await?;
            Ok(Json(json!({ "success": true, "usuarios": users })))
        }
        "obtener" => match state.storage.get_user(q.id).await? {
            Some(user) => Ok(Json(json!({ "success": true, "usuario": user }))),
            None => Ok(Json(json!({ "success": false, "error": "user not found" }))),
        },
        "eliminar" => {
            state.storage.delete_user(q.id).await?;
            info!(user_id = q.id, "user deleted");
            Ok(Json(json!({ "success": true })))
        }
        _ => Err(PlazaError::Validation("unknown action".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct UserUpsert {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub store_id: i64,
}

/// POST /admin/usuarios — create (id absent/0) or update.
pub async fn users_upsert(
    State(state): State<PlazaState>,
    Json(input): Json<UserUpsert>,
) -> Result<Json<Value>, PlazaError> {
    let email = input.email.trim();
    if email.is_empty() || input.store_id <= 0 {
        return Ok(Json(json!({
            "success": false,
            "error": "email and store_id are required",
        })));
    }

    if !state.storage.store_exists(input.store_id).await? {
        return Ok(Json(json!({ "success": false, "error": "store not found" })));
    }

    let username = normalize(input.username.as_deref());
    let display_name = normalize(input.display_name.as_deref());

    if input.id > 0 {
        let hash = match input.password.is_empty() {
            true => None,
            false => {
                if input.password.len() < MIN_PASSWORD_LEN {
                    return Ok(Json(json!({
                        "success": false,
                        "error": format!("password must be at least {MIN_PASSWORD_LEN} characters"),
                    })));
                }
                Some(bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?)
            }
        };
        state
            .storage
            .update_user(
                input.id,
                email,
                username,
                display_name,
                hash.as_deref(),
                input.store_id,
            )
            .await?;
        info!(user_id = input.id, "user updated");
        Ok(Json(json!({ "success": true, "id": input.id })))
    } else {
        if input.password.is_empty() {
            return Ok(Json(json!({
                "success": false,
                "error": "password is required for new users",
            })));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Ok(Json(json!({
                "success": false,
                "error": format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            })));
        }
        let hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?;
        let id = state
            .storage
            .insert_user(email, username, display_name, &hash, input.store_id)
            .await?;
        info!(user_id = id, "user created");
        Ok(Json(json!({ "success": true, "id": id })))
    }
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
