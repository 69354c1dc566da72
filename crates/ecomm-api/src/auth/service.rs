//! Authentication service layer
//!
//! Owns the session lifecycle: login creates a session, refresh exchanges
//! a session's refresh token for a new access token, logout and revoke
//! mark the session revoked. The storage backends are passive; every
//! state decision is made here.

use super::jwt::{new_token_id, JwtError, TokenIssuer};
use super::password::{
    hash_password_with_config, validate_password_strength, verify_password, PasswordConfig,
};
use crate::error::AuthError;
use chrono::{DateTime, Utc};
use ecomm_core::{Identity, IdentityRepository, Session, SessionState, SessionStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Tokens issued by a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Access token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub session_id: String,
    pub refresh_token: String,
}

/// New access token bound to an existing session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// User information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for UserInfo {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            name: identity.name,
            email: identity.email,
            is_admin: identity.is_admin,
            created_at: identity.created_at,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityRepository>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenIssuer>,
    password_config: PasswordConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            identities,
            sessions,
            tokens,
            password_config: PasswordConfig::default(),
        }
    }

    /// Override the Argon2 cost parameters used for new hashes
    pub fn with_password_config(mut self, config: PasswordConfig) -> Self {
        self.password_config = config;
        self
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserInfo)` - Newly created user
    /// * `Err(AuthError)` - Bad email, weak password, or duplicate email
    pub async fn register(
        &self,
        request: RegisterRequest,
        is_admin: bool,
    ) -> Result<UserInfo, AuthError> {
        if !request.email.contains('@') {
            return Err(AuthError::BadRequest("Invalid email format".to_string()));
        }
        if request.name.trim().is_empty() {
            return Err(AuthError::BadRequest("Name must not be empty".to_string()));
        }

        validate_password_strength(&request.password)
            .map_err(|e| AuthError::BadRequest(format!("Password validation failed: {e}")))?;

        let password_hash = hash_password_with_config(&request.password, &self.password_config)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let identity = self
            .identities
            .create(Identity::new(
                request.name,
                request.email,
                password_hash,
                is_admin,
            ))
            .await?;

        tracing::info!(user_id = %identity.id, is_admin, "user registered");
        Ok(identity.into())
    }

    /// Login with email and password
    ///
    /// Creates a new, independent session. An unknown email and a wrong
    /// password produce the same error. If the session cannot be stored
    /// the minted tokens are dropped and the storage error is returned.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let identity = match self.identities.find_by_email(&request.email).await {
            Ok(identity) => identity,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(&request.password, &identity.password_hash) {
            tracing::debug!(user_id = %identity.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = new_token_id();
        let now = Utc::now();
        let access_expires_at = self.tokens.access_expiry(now).map_err(token_error)?;
        let refresh_expires_at = self.tokens.refresh_expiry(now).map_err(token_error)?;

        let (access_token, access_claims) = self
            .tokens
            .issue(
                &identity.email,
                identity.id,
                &session_id,
                identity.is_admin,
                access_expires_at,
            )
            .map_err(token_error)?;

        let (refresh_token, refresh_claims) = self
            .tokens
            .issue_refresh(
                &identity.email,
                identity.id,
                &session_id,
                identity.is_admin,
                refresh_expires_at,
            )
            .map_err(token_error)?;

        let refresh_expires_at = refresh_claims.expires_at();
        self.sessions
            .create(Session::new(
                refresh_claims.jti.clone(),
                identity.email.clone(),
                refresh_token.clone(),
                refresh_expires_at,
            ))
            .await?;

        tracing::info!(user_id = %identity.id, session_id = %refresh_claims.jti, "session created");

        Ok(LoginResponse {
            session_id: refresh_claims.jti,
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            access_token_expires_at: access_claims.expires_at(),
            refresh_token_expires_at: refresh_expires_at,
        })
    }

    /// Exchange a session's refresh token for a new access token
    ///
    /// The refresh token itself is not rotated and the session is left
    /// untouched on success. A session found past its expiry is marked
    /// revoked before `SessionExpired` is returned. The presented token is
    /// compared with the stored one in constant time and must also verify
    /// as a refresh token.
    pub async fn refresh(
        &self,
        session_id: &str,
        refresh_token: &str,
    ) -> Result<RefreshResponse, AuthError> {
        let session = self.sessions.get(session_id).await?;

        match session.state() {
            SessionState::Active => {}
            SessionState::Revoked => return Err(AuthError::SessionRevoked),
            SessionState::Expired => {
                self.sessions.set_revoked(&session.id).await?;
                tracing::info!(session_id = %session.id, "expired session revoked on refresh");
                return Err(AuthError::SessionExpired);
            }
        }

        let matches: bool = session
            .refresh_token
            .as_bytes()
            .ct_eq(refresh_token.as_bytes())
            .into();
        if !matches {
            tracing::warn!(session_id = %session.id, "refresh token does not match session");
            return Err(AuthError::TokenMismatch);
        }
        self.tokens.validate_refresh(refresh_token)?;

        let identity = self.identities.find_by_email(&session.email).await?;
        let expires_at = self.tokens.access_expiry(Utc::now()).map_err(token_error)?;

        let (access_token, claims) = self
            .tokens
            .issue(
                &identity.email,
                identity.id,
                &session.id,
                identity.is_admin,
                expires_at,
            )
            .map_err(token_error)?;

        tracing::debug!(session_id = %session.id, "access token refreshed");

        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            access_token_expires_at: claims.expires_at(),
        })
    }

    /// End a session at the owner's request
    ///
    /// Logging out an already revoked session succeeds without a write.
    pub async fn logout(&self, session_id: &str) -> Result<(), AuthError> {
        self.mark_revoked(session_id).await
    }

    /// Forcibly end a session; same transition as logout
    pub async fn revoke(&self, session_id: &str) -> Result<(), AuthError> {
        self.mark_revoked(session_id).await
    }

    async fn mark_revoked(&self, session_id: &str) -> Result<(), AuthError> {
        let session = self.sessions.get(session_id).await?;

        if session.is_revoked {
            tracing::debug!(session_id, "session already revoked");
            return Ok(());
        }

        self.sessions.set_revoked(session_id).await?;
        tracing::info!(session_id, "session revoked");
        Ok(())
    }

    /// Load the current user's profile
    pub async fn current_user(&self, email: &str) -> Result<UserInfo, AuthError> {
        Ok(self.identities.find_by_email(email).await?.into())
    }

    /// Delete an account together with the session it is calling from
    ///
    /// A session that is already gone does not fail the deletion.
    pub async fn delete_account(&self, identity_id: Uuid, session_id: &str) -> Result<(), AuthError> {
        self.identities.delete(identity_id).await?;

        match self.sessions.delete(session_id).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %identity_id, session_id, "account deleted");
        Ok(())
    }
}

fn token_error(e: JwtError) -> AuthError {
    AuthError::Internal(format!("Failed to generate token: {e}"))
}
