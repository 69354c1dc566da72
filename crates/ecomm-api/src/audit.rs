//! Security audit logging for authentication events
//!
//! Every login, logout, refresh, revocation and gate rejection is logged
//! at INFO level with the "audit" target, so these records can be routed
//! separately from application logs.
//!
//! # Example
//!
//! ```ignore
//! use ecomm_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     email: request.email.clone(),
//!     session_id: response.session_id.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: None,
//! });
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful login; a new session was created
    LoginSuccess {
        email: String,
        session_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Session ended by its owner
    Logout {
        user_id: String,
        email: String,
        session_id: String,
        ip_address: Option<String>,
    },

    /// Session ended by an administrator
    SessionRevoked {
        session_id: String,
        /// Subject of the admin token that performed the revocation
        revoked_by: String,
        ip_address: Option<String>,
    },

    /// New access token issued from a refresh token
    TokenRefresh {
        session_id: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh refused (revoked, expired or mismatched)
    RefreshRejected {
        session_id: String,
        reason: String,
        ip_address: Option<String>,
    },

    /// Account created
    Registration {
        user_id: Uuid,
        email: String,
        is_admin: bool,
        ip_address: Option<String>,
    },

    /// Account deleted by its owner
    AccountDeleted {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
    },

    /// Authenticated caller without the required privilege
    AccessDenied {
        user_id: Option<Uuid>,
        email: Option<String>,
        resource: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, forged or expired bearer token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

impl AuditEvent {
    /// Short human-readable label for the log line
    pub fn label(&self) -> &'static str {
        match self {
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::Logout { .. } => "User logout",
            AuditEvent::SessionRevoked { .. } => "Session revoked",
            AuditEvent::TokenRefresh { .. } => "Token refresh",
            AuditEvent::RefreshRejected { .. } => "Token refresh rejected",
            AuditEvent::Registration { .. } => "Registration successful",
            AuditEvent::AccountDeleted { .. } => "Account deleted",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::InvalidToken { .. } => "Invalid token",
        }
    }
}

/// Log a security audit event with structured fields
///
/// The whole event is serialized to JSON under the `event` field; the
/// most useful keys are also emitted as separate fields for filtering.
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));
    let label = event.label();

    match event {
        AuditEvent::LoginSuccess {
            email,
            session_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                email = %email,
                session_id = %session_id,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::Logout {
            user_id,
            session_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                session_id = %session_id,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::SessionRevoked {
            session_id,
            revoked_by,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                session_id = %session_id,
                revoked_by = %revoked_by,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::TokenRefresh {
            session_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                session_id = %session_id,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::RefreshRejected {
            session_id,
            reason,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                session_id = %session_id,
                reason = %reason,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::Registration {
            user_id,
            email,
            is_admin,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                email = %email,
                is_admin = %is_admin,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::AccountDeleted {
            user_id,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = ?user_id,
                resource = %resource,
                ip_address = ?ip_address,
                "{label}"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "{label}"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop), then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract the user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
