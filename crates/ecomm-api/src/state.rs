//! Application state management

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordConfig;
use crate::auth::service::AuthService;
use ecomm_core::config::AppConfig;
use ecomm_core::{ConfigError, IdentityRepository, InMemoryStore, SessionStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token signer/validator built once from the auth config
    pub tokens: Arc<TokenIssuer>,
    /// Session lifecycle and account operations
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state over the given storage backends
    ///
    /// Fails when the auth configuration has no signing key.
    pub fn new(
        config: AppConfig,
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let tokens = Arc::new(TokenIssuer::new(&config.auth)?);
        let auth = AuthService::new(identities, sessions, tokens.clone());

        Ok(Self {
            config,
            tokens,
            auth,
            start_time: Instant::now(),
        })
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Result<Self, ConfigError> {
        let store = Arc::new(InMemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    /// Override the password hashing cost
    pub fn with_password_config(mut self, password_config: PasswordConfig) -> Self {
        self.auth = self.auth.with_password_config(password_config);
        self
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
