//! Account handlers: registration and self-deletion

use crate::audit::{audit_log, extract_ip_address, AuditEvent};
use crate::auth::{Claims, RegisterRequest, UserInfo};
use crate::error::AuthError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Register a new user account
///
/// Accounts created through the API are never administrators.
///
/// # Responses
///
/// * `201 Created` - User successfully registered
/// * `400 Bad Request` - Invalid email or weak password
/// * `409 Conflict` - Email already registered
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserInfo),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state.auth.register(request, false).await?;

    if let Ok(user_id) = Uuid::parse_str(&user.id) {
        audit_log(&AuditEvent::Registration {
            user_id,
            email: user.email.clone(),
            is_admin: user.is_admin,
            ip_address: extract_ip_address(&headers),
        });
    }

    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete the caller's account
///
/// Removes the identity and the session the access token was minted with.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Account not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::BadRequest("Token subject is not a valid id".to_string()))?;

    state.auth.delete_account(user_id, &claims.jti).await?;

    audit_log(&AuditEvent::AccountDeleted {
        user_id,
        email: claims.email,
        ip_address: extract_ip_address(&headers),
    });

    Ok(StatusCode::NO_CONTENT)
}
