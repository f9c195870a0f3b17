//! Session store: opaque random tokens bound to a user row and an expiry.
//!
//! Sessions are never refreshed or revoked server-side; they expire and the
//! user re-authenticates. Expired rows are garbage-collected opportunistically
//! on each validation, not by a background sweep.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::db::PlazaStorage;
use crate::error::PlazaError;

/// Context attached to a validated session: everything a handler needs to
/// act on behalf of the logged-in user.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub store_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: PlazaStorage,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(storage: PlazaStorage, ttl_hours: i64) -> Self {
        Self {
            storage,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a fresh session for a user: 256 bits of CSPRNG entropy,
    /// hex-encoded, persisted with a fixed TTL.
    pub async fn issue(&self, user_id: i64) -> Result<IssuedSession, PlazaError> {
        let token = generate_token();
        let expires_at = Utc::now() + self.ttl;
        self.storage
            .insert_session(&token, user_id, &to_rfc3339(expires_at))
            .await?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Validate a token: the row must exist, the expiry must be strictly in
    /// the future, and the owning user must be active. Sweeps expired rows
    /// first; a failed sweep is logged but never blocks validation.
    pub async fn validate(&self, token: &str) -> Result<UserContext, PlazaError> {
        if let Err(e) = self.sweep_expired().await {
            warn!(error = %e, "failed to sweep expired sessions");
        }

        if token.is_empty() {
            return Err(PlazaError::Unauthorized {
                debug: "empty session token".to_string(),
            });
        }

        let Some(row) = self.storage.find_session(token).await? else {
            return Err(PlazaError::Unauthorized {
                debug: "unknown session token".to_string(),
            });
        };

        let expires_at = DateTime::parse_from_rfc3339(&row.expires_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PlazaError::Unauthorized {
                debug: format!("unparseable session expiry: {e}"),
            })?;
        if expires_at <= Utc::now() {
            return Err(PlazaError::Unauthorized {
                debug: "session expired".to_string(),
            });
        }

        if !row.user_active {
            return Err(PlazaError::Unauthorized {
                debug: "user is inactive".to_string(),
            });
        }

        Ok(UserContext {
            user_id: row.user_id,
            email: row.email,
            username: row.username,
            display_name: row.display_name,
            store_id: row.store_id,
        })
    }

    /// Delete sessions whose expiry has passed.
    pub async fn sweep_expired(&self) -> Result<u64, PlazaError> {
        self.storage
            .delete_expired_sessions(&to_rfc3339(Utc::now()))
            .await
    }
}

/// Fixed-width RFC3339 so string comparison in SQL matches chronological order.
fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
