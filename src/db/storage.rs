use crate::db::models::{LoginCandidate, SessionJoinRow, StoreRow, UserPublic};
use crate::db::schema::SQLITE_INIT;
use crate::error::PlazaError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Parameterized access to the three local tables (stores, users, sessions).
/// Every write is a single-row statement; no multi-row invariants exist,
/// so no explicit transactions are used.
#[derive(Clone)]
pub struct PlazaStorage {
    pool: SqlitePool,
}

impl PlazaStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) and initialize the database.
    pub async fn connect(database_url: &str) -> Result<Self, PlazaError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), PlazaError> {
        // sqlx::query runs one statement at a time; split the bundled DDL.
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- stores ----

    pub async fn list_stores(&self) -> Result<Vec<StoreRow>, PlazaError> {
        let rows = sqlx::query(
            r#"SELECT id, name, base_url, wp_username, app_password_encrypted, active,
               created_at, updated_at
               FROM stores ORDER BY id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_store).collect()
    }

    pub async fn get_store(&self, id: i64) -> Result<Option<StoreRow>, PlazaError> {
        let row = sqlx::query(
            r#"SELECT id, name, base_url, wp_username, app_password_encrypted, active,
               created_at, updated_at
               FROM stores WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_store).transpose()
    }

    pub async fn insert_store(
        &self,
        name: &str,
        base_url: &str,
        wp_username: &str,
        app_password_encrypted: &str,
    ) -> Result<i64, PlazaError> {
        let result = sqlx::query(
            r#"INSERT INTO stores (name, base_url, wp_username, app_password_encrypted)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(name)
        .bind(base_url)
        .bind(wp_username)
        .bind(app_password_encrypted)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Update a store. `app_password_encrypted = None` keeps the stored
    /// ciphertext untouched.
    pub async fn update_store(
        &self,
        id: i64,
        name: &str,
        base_url: &str,
        wp_username: &str,
        app_password_encrypted: Option<&str>,
    ) -> Result<(), PlazaError> {
        match app_password_encrypted {
            Some(blob) => {
                sqlx::query(
                    r#"UPDATE stores
                       SET name = ?, base_url = ?, wp_username = ?, app_password_encrypted = ?,
                           updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
                       WHERE id = ?"#,
                )
                .bind(name)
                .bind(base_url)
                .bind(wp_username)
                .bind(blob)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"UPDATE stores
                       SET name = ?, base_url = ?, wp_username = ?,
                           updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
                       WHERE id = ?"#,
                )
                .bind(name)
                .bind(base_url)
                .bind(wp_username)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn delete_store(&self, id: i64) -> Result<(), PlazaError> {
        sqlx::query("DELETE FROM stores WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn user_count_for_store(&self, store_id: i64) -> Result<i64, PlazaError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE store_id = ?")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn store_exists(&self, id: i64) -> Result<bool, PlazaError> {
        let rec: Option<(i64,)> = sqlx::query_as("SELECT id FROM stores WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.is_some())
    }

    // ---- users ----

    pub async fn list_users(&self) -> Result<Vec<UserPublic>, PlazaError> {
        let rows = sqlx::query(
            r#"SELECT u.id, u.email, u.username, u.display_name, u.store_id, u.active,
               u.created_at, u.updated_at, s.name AS store_name
               FROM users u
               LEFT JOIN stores s ON u.store_id = s.id
               ORDER BY u.id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_user_public).collect()
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<UserPublic>, PlazaError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.username, u.display_name, u.store_id, u.active,
               u.created_at, u.updated_at, s.name AS store_name
               FROM users u
               LEFT JOIN stores s ON u.store_id = s.id
               WHERE u.id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user_public).transpose()
    }

    pub async fn user_password_hash(&self, id: i64) -> Result<Option<Option<String>>, PlazaError> {
        let rec: Option<(Option<String>,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(rec.map(|(hash,)| hash))
    }

    pub async fn insert_user(
        &self,
        email: &str,
        username: Option<&str>,
        display_name: Option<&str>,
        password_hash: &str,
        store_id: i64,
    ) -> Result<i64, PlazaError> {
        let result = sqlx::query(
            r#"INSERT INTO users (email, username, display_name, password_hash, store_id)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(email)
        .bind(username)
        .bind(display_name)
        .bind(password_hash)
        .bind(store_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Update a user. `password_hash = None` keeps the stored hash.
    pub async fn update_user(
        &self,
        id: i64,
        email: &str,
        username: Option<&str>,
        display_name: Option<&str>,
        password_hash: Option<&str>,
        store_id: i64,
    ) -> Result<(), PlazaError> {
        match password_hash {
            Some(hash) => {
                sqlx::query(
                    r#"UPDATE users
                       SET email = ?, username = ?, display_name = ?, password_hash = ?,
                           store_id = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
                       WHERE id = ?"#,
                )
                .bind(email)
                .bind(username)
                .bind(display_name)
                .bind(hash)
                .bind(store_id)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"UPDATE users
                       SET email = ?, username = ?, display_name = ?, store_id = ?,
                           updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
                       WHERE id = ?"#,
                )
                .bind(email)
                .bind(username)
                .bind(display_name)
                .bind(store_id)
                .bind(id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), PlazaError> {
        sqlx::query(
            r#"UPDATE users
               SET password_hash = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
               WHERE id = ?"#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), PlazaError> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Single joined lookup for the login flow: matches email OR username,
    /// case-sensitive as stored, with the assigned store's fields attached.
    pub async fn find_login(&self, identifier: &str) -> Result<Option<LoginCandidate>, PlazaError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.username, u.display_name, u.password_hash, u.active,
               s.id AS store_id, s.name AS store_name, s.base_url AS store_url,
               s.active AS store_active
               FROM users u
               LEFT JOIN stores s ON u.store_id = s.id
               WHERE u.email = ? OR u.username = ?"#,
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_login_candidate).transpose()
    }

    // ---- sessions ----

    pub async fn insert_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: &str,
    ) -> Result<(), PlazaError> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_session(&self, token: &str) -> Result<Option<SessionJoinRow>, PlazaError> {
        let row = sqlx::query(
            r#"SELECT s.expires_at, u.id AS user_id, u.email, u.username, u.display_name,
               u.store_id, u.active AS user_active
               FROM sessions s
               INNER JOIN users u ON s.user_id = u.id
               WHERE s.token = ?"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_session_join).transpose()
    }

    /// Delete sessions whose expiry has passed. Returns the number removed.
    pub async fn delete_expired_sessions(&self, now: &str) -> Result<u64, PlazaError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn session_count_for_user(&self, user_id: i64) -> Result<i64, PlazaError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    // ---- row mapping ----

    fn row_to_store(row: SqliteRow) -> Result<StoreRow, PlazaError> {
        let active: i64 = row.try_get("active")?;
        Ok(StoreRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            base_url: row.try_get("base_url")?,
            wp_username: row.try_get("wp_username")?,
            app_password_encrypted: row.try_get("app_password_encrypted")?,
            active: active != 0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_user_public(row: SqliteRow) -> Result<UserPublic, PlazaError> {
        let active: i64 = row.try_get("active")?;
        Ok(UserPublic {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            store_id: row.try_get("store_id")?,
            store_name: row.try_get("store_name")?,
            active: active != 0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_login_candidate(row: SqliteRow) -> Result<LoginCandidate, PlazaError> {
        let active: i64 = row.try_get("active")?;
        let store_active: Option<i64> = row.try_get("store_active")?;
        Ok(LoginCandidate {
            user_id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            password_hash: row.try_get("password_hash")?,
            active: active != 0,
            store_id: row.try_get("store_id")?,
            store_name: row.try_get("store_name")?,
            store_url: row.try_get("store_url")?,
            store_active: store_active.unwrap_or(0) != 0,
        })
    }

    fn row_to_session_join(row: SqliteRow) -> Result<SessionJoinRow, PlazaError> {
        let user_active: i64 = row.try_get("user_active")?;
        Ok(SessionJoinRow {
            expires_at: row.try_get("expires_at")?,
            user_id: row.try_get("user_id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            store_id: row.try_get("store_id")?,
            user_active: user_active != 0,
        })
    }
}
