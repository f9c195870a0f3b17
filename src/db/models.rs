use serde::Serialize;

/// Placeholder returned instead of the stored ciphertext on admin surfaces.
pub const REDACTED_CREDENTIAL: &str = "***ENCRYPTED***";

/// Full store row, including the encrypted credential. Internal only;
/// use [`StorePublic`] for anything that leaves the server.
#[derive(Debug, Clone)]
pub struct StoreRow {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    pub wp_username: String,
    pub app_password_encrypted: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Store as exposed by the admin CRUD surface: the credential field is
/// always redacted, never decrypted.
#[derive(Debug, Clone, Serialize)]
pub struct StorePublic {
    pub id: i64,
    pub name: String,
    #[serde(rename = "url")]
    pub base_url: String,
    #[serde(rename = "wp_user")]
    pub wp_username: String,
    pub app_password_encrypted: &'static str,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StoreRow> for StorePublic {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            base_url: row.base_url,
            wp_username: row.wp_username,
            app_password_encrypted: REDACTED_CREDENTIAL,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// User as exposed by the admin CRUD surface; the password hash never
/// leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: i64,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub store_id: Option<i64>,
    pub store_name: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything the login flow needs in a single joined lookup: user fields
/// plus the assigned store's public fields and flags.
#[derive(Debug, Clone)]
pub struct LoginCandidate {
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub active: bool,
    pub store_id: Option<i64>,
    pub store_name: Option<String>,
    pub store_url: Option<String>,
    pub store_active: bool,
}

/// Session row joined with its owning user, as returned by token lookup.
/// Expiry and the user's `active` flag are checked by the session store.
#[derive(Debug, Clone)]
pub struct SessionJoinRow {
    pub expires_at: String,
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub store_id: Option<i64>,
    pub user_active: bool,
}
