//! Session handlers: refresh and administrative revocation

use super::MessageResponse;
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::{Claims, RefreshRequest, RefreshResponse};
use crate::error::AuthError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Refresh access token
///
/// Exchanges the refresh token bound to a session for a new access token.
/// The refresh token is not rotated. A session found past its expiry is
/// revoked and `SESSION_EXPIRED` is returned.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/refresh",
    tag = "sessions",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Session revoked, expired or token mismatch", body = crate::error::ApiError),
        (status = 404, description = "Session not found", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthError> {
    match state
        .auth
        .refresh(&request.session_id, &request.refresh_token)
        .await
    {
        Ok(response) => {
            audit_log(&AuditEvent::TokenRefresh {
                session_id: request.session_id,
                ip_address: extract_ip_address(&headers),
                user_agent: extract_user_agent(&headers),
            });
            Ok(Json(response))
        }
        Err(e) => {
            if matches!(
                e,
                AuthError::SessionRevoked | AuthError::SessionExpired | AuthError::TokenMismatch
            ) {
                audit_log(&AuditEvent::RefreshRejected {
                    session_id: request.session_id,
                    reason: e.to_string(),
                    ip_address: extract_ip_address(&headers),
                });
            }
            Err(e)
        }
    }
}

/// Revoke a session (admin only)
///
/// Same transition as logout; revoking an already revoked session
/// succeeds.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/revoke",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Admin privilege required", body = crate::error::ApiError),
        (status = 404, description = "Session not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.revoke(&session_id).await?;

    audit_log(&AuditEvent::SessionRevoked {
        session_id,
        revoked_by: claims.sub,
        ip_address: extract_ip_address(&headers),
    });

    Ok(Json(MessageResponse::new("Session revoked")))
}
