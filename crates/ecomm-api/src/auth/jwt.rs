//! JWT token generation and validation
//!
//! Implements HMAC-SHA256 signed access and refresh tokens. Both kinds
//! carry the same identity claims plus a `typ` claim naming the kind, so
//! a refresh token is never accepted where an access token is expected.
//! The token id (`jti`) is chosen by the caller so an access token and
//! its paired refresh token can share the session id.

use chrono::{DateTime, Duration, Utc};
use ecomm_core::{AuthConfig, ConfigError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which of the two token kinds a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT Claims structure containing identity information
///
/// These claims are embedded in every token and extracted during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - identity ID
    pub sub: String,
    /// JWT ID - session id for tokens minted at login
    pub jti: String,
    /// Token kind
    pub typ: TokenKind,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
    /// Identity's email address
    pub email: String,
    /// Administrative flag
    pub is_admin: bool,
}

impl Claims {
    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Expected a {expected} token")]
    UnexpectedKind { expected: TokenKind },

    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,
}

/// Generate a fresh token id
pub fn new_token_id() -> String {
    Uuid::new_v4().to_string()
}

fn ttl_from_secs(key: &str, secs: u64) -> Result<Duration, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: secs.to_string(),
        })
}

/// Signs and verifies tokens with a key loaded once at startup
pub struct TokenIssuer {
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from the auth configuration
    ///
    /// Fails when the signing key is empty or a lifetime is zero or
    /// beyond [`ecomm_core::config::MAX_TTL_SECS`].
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        // HS256 only. Other algorithms the library knows fail verification;
        // names it does not know (such as `none`) fail header parsing.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Ok(Self {
            issuer: config.issuer.clone(),
            access_ttl: ttl_from_secs("JWT_ACCESS_TTL_SECS", config.access_ttl_secs)?,
            refresh_ttl: ttl_from_secs("JWT_REFRESH_TTL_SECS", config.refresh_ttl_secs)?,
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_key.as_bytes()),
            validation,
        })
    }

    /// Expiry for an access token issued at `now`
    pub fn access_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, JwtError> {
        now.checked_add_signed(self.access_ttl)
            .ok_or(JwtError::ExpiryOutOfRange)
    }

    /// Expiry for a refresh token (and its session) issued at `now`
    pub fn refresh_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, JwtError> {
        now.checked_add_signed(self.refresh_ttl)
            .ok_or(JwtError::ExpiryOutOfRange)
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign an access token carrying the given identity claims
    ///
    /// Returns the encoded token together with the claims embedded in it,
    /// so callers can read the token id and expiry without re-parsing.
    pub fn issue(
        &self,
        email: &str,
        identity_id: Uuid,
        token_id: &str,
        is_admin: bool,
        expires_at: DateTime<Utc>,
    ) -> Result<(String, Claims), JwtError> {
        self.sign(TokenKind::Access, email, identity_id, token_id, is_admin, expires_at)
    }

    /// Sign a refresh token; same claims as [`issue`](Self::issue)
    pub fn issue_refresh(
        &self,
        email: &str,
        identity_id: Uuid,
        token_id: &str,
        is_admin: bool,
        expires_at: DateTime<Utc>,
    ) -> Result<(String, Claims), JwtError> {
        self.sign(TokenKind::Refresh, email, identity_id, token_id, is_admin, expires_at)
    }

    fn sign(
        &self,
        typ: TokenKind,
        email: &str,
        identity_id: Uuid,
        token_id: &str,
        is_admin: bool,
        expires_at: DateTime<Utc>,
    ) -> Result<(String, Claims), JwtError> {
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: identity_id.to_string(),
            jti: token_id.to_string(),
            typ,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            email: email.to_string(),
            is_admin,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok((token, claims))
    }

    /// Validate a token of either kind and extract its claims
    ///
    /// Signature and algorithm are checked before expiry, so a forged
    /// token is reported as `InvalidSignature` even when it is also stale.
    /// A header naming an algorithm the library does not recognise, such
    /// as `none`, cannot be parsed and is reported as `Malformed`.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        use jsonwebtoken::errors::ErrorKind;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => JwtError::InvalidSignature,
                _ => JwtError::Malformed,
            },
        )?;

        Ok(token_data.claims)
    }

    /// Validate a token that must be an access token
    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenKind::Access)
    }

    /// Validate a token that must be a refresh token
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenKind::Refresh)
    }

    fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.validate(token)?;
        if claims.typ != expected {
            return Err(JwtError::UnexpectedKind { expected });
        }
        Ok(claims)
    }
}
