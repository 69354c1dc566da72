//! Authorization gate for protecting routes
//!
//! Extracts and validates the bearer token from the Authorization header.
//! Only access tokens pass; a refresh token is rejected. On success, the decoded [`Claims`] are added to request extensions and
//! can be extracted in handlers with `Extension<Claims>`.
//!
//! The gate is a signature-only check: it never reads the session store,
//! so an access token stays usable until its own expiry even after the
//! session it was minted with is revoked.

use super::jwt::{Claims, TokenIssuer};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::AuthError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The header must be exactly two whitespace-separated fields, the first
/// of which is the `Bearer` keyword.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Validate the request's bearer access token and return its claims
pub fn require_auth(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<Claims, AuthError> {
    let token = bearer_token(headers)?;
    Ok(tokens.validate_access(token)?)
}

/// Like [`require_auth`], but also requires the admin claim
pub fn require_admin(tokens: &TokenIssuer, headers: &HeaderMap) -> Result<Claims, AuthError> {
    let claims = require_auth(tokens, headers)?;
    if !claims.is_admin {
        return Err(AuthError::Forbidden);
    }
    Ok(claims)
}

fn audit_invalid_token(request: &Request<Body>, err: &AuthError) {
    audit_log(&AuditEvent::InvalidToken {
        ip_address: extract_ip_address(request.headers()),
        user_agent: extract_user_agent(request.headers()),
        reason: err.to_string(),
    });
}

/// Middleware requiring a valid access token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use ecomm_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/api/v1/auth/me", get(me))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = match require_auth(&state.tokens, request.headers()) {
        Ok(claims) => claims,
        Err(e) => {
            audit_invalid_token(&request, &e);
            return Err(e);
        }
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Middleware requiring a valid access token with the admin claim
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = match require_auth(&state.tokens, request.headers()) {
        Ok(claims) => claims,
        Err(e) => {
            audit_invalid_token(&request, &e);
            return Err(e);
        }
    };

    if !claims.is_admin {
        audit_log(&AuditEvent::AccessDenied {
            user_id: Uuid::parse_str(&claims.sub).ok(),
            email: Some(claims.email.clone()),
            resource: format!("{} {}", request.method(), request.uri().path()),
            ip_address: extract_ip_address(request.headers()),
            user_agent: extract_user_agent(request.headers()),
        });
        return Err(AuthError::Forbidden);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
