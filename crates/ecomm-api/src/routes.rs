//! API route definitions and OpenAPI document

use crate::auth::middleware::{admin_middleware, auth_middleware};
use crate::handlers::{auth, health, sessions, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// ecomm API document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ecomm Auth API",
        description = "Login, session refresh/revocation and account management. \
                       Protected endpoints require an `Authorization: Bearer <token>` header."
    ),
    paths(
        health::health_check,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        sessions::refresh_handler,
        sessions::revoke_handler,
        users::register_handler,
        users::delete_me_handler,
    ),
    components(schemas(
        crate::error::ApiError,
        crate::handlers::MessageResponse,
        health::HealthResponse,
        crate::auth::LoginRequest,
        crate::auth::LoginResponse,
        crate::auth::RefreshRequest,
        crate::auth::RefreshResponse,
        crate::auth::RegisterRequest,
        crate::auth::UserInfo,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login, logout and current user"),
        (name = "sessions", description = "Refresh and revocation"),
        (name = "users", description = "Account registration and deletion"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/users", post(users::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/sessions/refresh", post(sessions::refresh_handler));

    // Any valid access token
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/users/me", delete(users::delete_me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Access token carrying the admin claim
    let admin_routes = Router::new()
        .route("/sessions/:id/revoke", post(sessions::revoke_handler))
        .route_layer(middleware::from_fn_with_state(state, admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}
