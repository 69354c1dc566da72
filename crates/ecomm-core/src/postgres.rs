//! PostgreSQL storage backend
//!
//! Provides identity and session persistence using SQLx and PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{Identity, IdentityRepository, Session, SessionStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        refresh_token TEXT NOT NULL,
        is_revoked BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS sessions_email_idx ON sessions (email)",
];

/// PostgreSQL identity and session store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `users` and `sessions` tables if they do not exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to apply schema: {e}")))?;
        }
        tracing::debug!(statements = SCHEMA.len(), "database schema ensured");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Identity {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Session row from database
#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    email: String,
    refresh_token: String,
    is_revoked: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            email: row.email,
            refresh_token: row.refresh_token,
            is_revoked: row.is_revoked,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl IdentityRepository for PgStore {
    async fn create(&self, identity: Identity) -> StoreResult<Identity> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, password_hash, is_admin, created_at, updated_at
            "#,
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.is_admin)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("email {} already registered", identity.email))
            } else {
                StoreError::Database(format!("Failed to create user: {e}"))
            }
        })?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Identity> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch user: {e}")))?;

        row.map(Identity::from)
            .ok_or_else(|| StoreError::NotFound("User".to_string()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("User".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create(&self, session: Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, email, refresh_token, is_revoked, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&session.id)
        .bind(&session.email)
        .bind(&session.refresh_token)
        .bind(session.is_revoked)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("session {} already exists", session.id))
            } else {
                StoreError::Database(format!("Failed to create session: {e}"))
            }
        })?;

        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Session> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, email, refresh_token, is_revoked, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch session: {e}")))?;

        row.map(Session::from)
            .ok_or_else(|| StoreError::NotFound("Session".to_string()))
    }

    async fn set_revoked(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE sessions SET is_revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to revoke session: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Session".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to delete session: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Session".to_string()));
        }
        Ok(())
    }
}
