//! In-memory storage backend
//!
//! Backs both identity lookup and session persistence with hash maps
//! behind async read/write locks. Used by tests and by the server when
//! no database URL is configured; nothing survives a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Identity, IdentityRepository, Session, SessionStore, StoreError, StoreResult};

/// Volatile identity and session store
#[derive(Default)]
pub struct InMemoryStore {
    /// Identities keyed by email
    identities: RwLock<HashMap<String, Identity>>,
    /// Sessions keyed by session id
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, revoked ones included
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn create(&self, identity: Identity) -> StoreResult<Identity> {
        let mut identities = self.identities.write().await;
        if identities.contains_key(&identity.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                identity.email
            )));
        }
        identities.insert(identity.email.clone(), identity.clone());
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Identity> {
        self.identities
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("User".to_string()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut identities = self.identities.write().await;
        let before = identities.len();
        identities.retain(|_, identity| identity.id != id);
        if identities.len() == before {
            return Err(StoreError::NotFound("User".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create(&self, session: Session) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Conflict(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Session".to_string()))
    }

    async fn set_revoked(&self, id: &str) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound("Session".to_string()))?;
        session.is_revoked = true;
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn identity(email: &str) -> Identity {
        Identity::new("Test", email, "hash", false)
    }

    #[tokio::test]
    async fn test_identity_create_and_lookup() {
        let store = InMemoryStore::new();
        let created = IdentityRepository::create(&store, identity("a@x.com"))
            .await
            .unwrap();

        let found = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_email("b@x.com").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        IdentityRepository::create(&store, identity("a@x.com"))
            .await
            .unwrap();
        let err = IdentityRepository::create(&store, identity("a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_identity_delete() {
        let store = InMemoryStore::new();
        let created = IdentityRepository::create(&store, identity("a@x.com"))
            .await
            .unwrap();

        IdentityRepository::delete(&store, created.id).await.unwrap();
        assert!(store.find_by_email("a@x.com").await.is_err());
        assert!(IdentityRepository::delete(&store, created.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = InMemoryStore::new();
        let session = Session::new("s1", "a@x.com", "tok", Utc::now() + Duration::days(1));
        SessionStore::create(&store, session.clone()).await.unwrap();

        let loaded = store.get("s1").await.unwrap();
        assert_eq!(loaded, session);

        store.set_revoked("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_revoked);
        assert_eq!(store.session_count().await, 1);

        SessionStore::delete(&store, "s1").await.unwrap();
        assert!(store.get("s1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_session_operations() {
        let store = InMemoryStore::new();
        assert!(store.set_revoked("nope").await.unwrap_err().is_not_found());
        assert!(SessionStore::delete(&store, "nope")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
