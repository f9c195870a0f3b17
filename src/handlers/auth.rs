//! Login and password-change endpoints.
//!
//! Every login rejection carries a distinct diagnostic (`debug` field, plus a
//! log line); the client-facing message is always the same generic one.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::PlazaError;
use crate::handlers::MIN_PASSWORD_LEN;
use crate::router::PlazaState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or username; matched case-sensitive, as stored.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth — verify credentials and issue a session token.
pub async fn login(
    State(state): State<PlazaState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, PlazaError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(PlazaError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let Some(candidate) = state.storage.find_login(&req.email).await? else {
        warn!(identifier = %req.email, "login failed: user not found");
        return Err(PlazaError::InvalidCredentials {
            debug: "user not found".to_string(),
        });
    };

    if !candidate.active {
        warn!(user_id = candidate.user_id, "login failed: user inactive");
        return Err(PlazaError::InvalidCredentials {
            debug: "user inactive".to_string(),
        });
    }

    let Some(store_id) = candidate.store_id else {
        warn!(user_id = candidate.user_id, "login failed: no store assigned");
        return Err(PlazaError::InvalidCredentials {
            debug: "user has no store assigned".to_string(),
        });
    };

    if !candidate.store_active {
        warn!(
            user_id = candidate.user_id,
            store_id, "login failed: store inactive"
        );
        return Err(PlazaError::InvalidCredentials {
            debug: "assigned store is inactive".to_string(),
        });
    }

    let Some(hash) = candidate
        .password_hash
        .as_deref()
        .filter(|h| !h.is_empty())
    else {
        warn!(
            user_id = candidate.user_id,
            "login failed: no password hash set"
        );
        return Err(PlazaError::InvalidCredentials {
            debug: "user has no password configured".to_string(),
        });
    };

    if !bcrypt::verify(&req.password, hash)? {
        warn!(user_id = candidate.user_id, "login failed: wrong password");
        return Err(PlazaError::InvalidCredentials {
            debug: "wrong password".to_string(),
        });
    }

    let issued = state.sessions.issue(candidate.user_id).await?;
    info!(user_id = candidate.user_id, store_id, "login succeeded");

    Ok(Json(json!({
        "success": true,
        "token": issued.token,
        "usuario": {
            "id": candidate.user_id,
            "email": candidate.email,
            "username": candidate.username,
            "display_name": candidate.display_name,
        },
        "tienda": {
            "id": store_id,
            "name": candidate.store_name,
            "url": candidate.store_url,
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// POST /cambiar-password — requires a valid session.
pub async fn change_password(
    State(state): State<PlazaState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, PlazaError> {
    let user = state.sessions.validate(&req.token).await?;

    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(PlazaError::Validation(
            "current and new password are required".to_string(),
        ));
    }
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(PlazaError::Validation(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let Some(stored) = state.storage.user_password_hash(user.user_id).await? else {
        return Err(PlazaError::NotFound {
            message: "User not found".to_string(),
            debug: format!("user id: {}", user.user_id),
        });
    };
    let Some(hash) = stored.filter(|h| !h.is_empty()) else {
        return Err(PlazaError::InvalidCredentials {
            debug: "user has no password configured".to_string(),
        });
    };

    if !bcrypt::verify(&req.current_password, &hash)? {
        warn!(user_id = user.user_id, "password change: wrong current password");
        return Err(PlazaError::InvalidCredentials {
            debug: "current password is incorrect".to_string(),
        });
    }

    let new_hash = bcrypt::hash(&req.new_password, bcrypt::DEFAULT_COST)?;
    state.storage.update_password(user.user_id, &new_hash).await?;
    info!(user_id = user.user_id, "password updated");

    Ok(Json(json!({
        "success": true,
        "message": "password updated",
    })))
}
