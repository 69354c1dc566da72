//! ecomm Core - Domain models, storage traits, and shared types
//!
//! This crate defines the abstractions the authentication core is built on:
//! - Identity and session records
//! - The session state machine
//! - Storage traits for identity lookup and session persistence
//! - In-memory and PostgreSQL storage backends
//! - Configuration management

pub mod config;
pub mod memory;
pub mod postgres;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Identity
// ============================================================================

/// A registered account
///
/// The email is the unique lookup key used by login; the id is the
/// immutable subject written into every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Lifecycle state of a refresh session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Not revoked and not yet past its expiry
    Active,
    /// Not revoked but past its expiry; cannot be refreshed
    Expired,
    /// Explicitly invalidated; terminal
    Revoked,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

/// Persistent record of an issued refresh token
///
/// Keyed by the token id shared between the access and refresh tokens
/// minted at login. Sessions are never deleted on logout, only revoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub refresh_token: String,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            refresh_token: refresh_token.into(),
            is_revoked: false,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// State of the session at `now`
    ///
    /// Revocation wins over expiry. A session whose expiry equals `now`
    /// is already expired.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_revoked {
            SessionState::Revoked
        } else if now >= self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Identity lookup and account persistence
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Store a new identity; fails with `Conflict` on a duplicate email
    async fn create(&self, identity: Identity) -> StoreResult<Identity>;

    /// Look up an identity by its email
    async fn find_by_email(&self, email: &str) -> StoreResult<Identity>;

    /// Remove an identity
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Passive persistence for refresh sessions
///
/// Backends hold no business rules; every state decision is made by the
/// caller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> StoreResult<()>;

    async fn get(&self, id: &str) -> StoreResult<Session>;

    async fn set_revoked(&self, id: &str) -> StoreResult<()>;

    /// Physically remove a session; only account deletion does this
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

// ============================================================================
// Tests
// ============================================================================
