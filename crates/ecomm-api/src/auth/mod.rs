//! Authentication and authorization module
//!
//! - Token generation and validation
//! - Password hashing with Argon2
//! - Authorization gate middleware
//! - Session lifecycle service

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{new_token_id, Claims, JwtError, TokenIssuer, TokenKind};
pub use middleware::{admin_middleware, auth_middleware, bearer_token, require_admin, require_auth};
pub use password::{
    hash_password, hash_password_with_config, validate_password_strength, verify_password,
    PasswordConfig, PasswordError,
};
pub use service::{
    AuthService, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    UserInfo,
};
