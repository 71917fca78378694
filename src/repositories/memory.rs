use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::{
        session::{Session, SessionOwner},
        user::{NewUser, User},
    },
    repositories::{session::SessionStore, user::UserStore},
};

#[derive(Clone, Copy)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    // Insertion order doubles as creation order.
    sessions: Vec<SessionRow>,
}

/// An in-process store implementing both [`UserStore`] and [`SessionStore`].
/// A single lock guards every collection so the email uniqueness check and
/// the insert happen atomically.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Raw stored password hash for `email`, if that user exists.
    pub async fn stored_password_hash(&self, email: &str) -> Option<String> {
        let collections = self.inner.read().await;
        collections
            .emails
            .get(email)
            .and_then(|id| collections.users.get(id))
            .map(|user| user.password_hash.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        new_user.check_schema().map_err(StoreError::Validation)?;

        let mut collections = self.inner.write().await;
        if collections.emails.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateKey(format!(
                "email {:?} already exists",
                new_user.email
            )));
        }

        let user = new_user.into_user(Uuid::new_v4(), Utc::now());
        collections.emails.insert(user.email.clone(), user.id);
        collections.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let collections = self.inner.read().await;
        Ok(collections
            .emails
            .get(email)
            .and_then(|id| collections.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: Uuid) -> Result<Session, StoreError> {
        let row = SessionRow {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
        };
        self.inner.write().await.sessions.push(row);
        Ok(Session {
            id: row.id,
            user_id: SessionOwner::Id(row.user_id),
            created_at: row.created_at,
        })
    }

    async fn find_session_by_id(
        &self,
        id: Uuid,
        expand_user: bool,
    ) -> Result<Option<Session>, StoreError> {
        let collections = self.inner.read().await;
        let Some(row) = collections.sessions.iter().find(|s| s.id == id) else {
            return Ok(None);
        };

        let owner = if expand_user {
            let user = collections.users.get(&row.user_id).ok_or_else(|| {
                StoreError::MissingData(format!("user {} referenced by session {}", row.user_id, id))
            })?;
            SessionOwner::User(Box::new(user.clone()))
        } else {
            SessionOwner::Id(row.user_id)
        };

        Ok(Some(Session {
            id: row.id,
            user_id: owner,
            created_at: row.created_at,
        }))
    }

    async fn delete_session_by_user_id_field(&self, value: Uuid) -> Result<u64, StoreError> {
        let mut collections = self.inner.write().await;
        match collections.sessions.iter().position(|s| s.user_id == value) {
            Some(index) => {
                collections.sessions.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_session_by_id(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut collections = self.inner.write().await;
        let before = collections.sessions.len();
        collections.sessions.retain(|s| s.id != id);
        Ok((before - collections.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: email.into(),
            password_hash: "$argon2id$v=19$placeholder".into(),
            address: "Arlington".into(),
            about: "Compilers".into(),
            image_url: Some("https://img.example/grace.png".into()),
        }
    }

    #[tokio::test]
    async fn creates_and_finds_user() {
        let store = MemoryStore::new();
        let created = store.create_user(new_user("grace@navy.mil")).await.unwrap();
        let found = store.find_user_by_email("grace@navy.mil").await.unwrap().unwrap();
        assert_eq!(created, found);
        assert_eq!(created.created_at, created.updated_at);
        assert!(store.find_user_by_email("nobody@navy.mil").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("grace@navy.mil")).await.unwrap();
        let err = store.create_user(new_user("grace@navy.mil")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn schema_violation_is_rejected() {
        let store = MemoryStore::new();
        let mut user = new_user("grace@navy.mil");
        user.about.clear();
        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref msg) if msg.contains("about")));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn session_lookup_with_and_without_expansion() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("grace@navy.mil")).await.unwrap();
        let session = store.create_session(user.id).await.unwrap();

        let plain = store.find_session_by_id(session.id, false).await.unwrap().unwrap();
        assert_eq!(plain.user_id, SessionOwner::Id(user.id));

        let expanded = store.find_session_by_id(session.id, true).await.unwrap().unwrap();
        assert_eq!(expanded.user_id, SessionOwner::User(Box::new(user)));

        assert!(store.find_session_by_id(Uuid::new_v4(), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_user_field_removes_one_oldest_session() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("grace@navy.mil")).await.unwrap();
        let first = store.create_session(user.id).await.unwrap();
        let second = store.create_session(user.id).await.unwrap();

        // The session id is not a user reference.
        assert_eq!(store.delete_session_by_user_id_field(first.id).await.unwrap(), 0);

        assert_eq!(store.delete_session_by_user_id_field(user.id).await.unwrap(), 1);
        assert!(store.find_session_by_id(first.id, false).await.unwrap().is_none());
        assert!(store.find_session_by_id(second.id, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_by_id() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("grace@navy.mil")).await.unwrap();
        let session = store.create_session(user.id).await.unwrap();
        assert_eq!(store.delete_session_by_id(session.id).await.unwrap(), 1);
        assert_eq!(store.delete_session_by_id(session.id).await.unwrap(), 0);
        assert_eq!(store.session_count().await, 0);
    }
}
