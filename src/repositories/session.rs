use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::session::{Session, SessionOwner},
    repositories::user::row_to_user,
};

/// Persistence for session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session owned by `user_id`, stamped with the current time.
    async fn create_session(&self, user_id: Uuid) -> Result<Session, StoreError>;

    /// Finds a session by its id, optionally resolving the owning user inline.
    async fn find_session_by_id(
        &self,
        id: Uuid,
        expand_user: bool,
    ) -> Result<Option<Session>, StoreError>;

    /// Deletes at most one session (the oldest) whose user reference equals
    /// `value`. Returns the number of deleted sessions.
    async fn delete_session_by_user_id_field(&self, value: Uuid) -> Result<u64, StoreError>;

    /// Deletes the session with the given id. Returns the number of deleted
    /// sessions.
    async fn delete_session_by_id(&self, id: Uuid) -> Result<u64, StoreError>;
}

/// PostgreSQL-backed session store.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: Pool,
}

impl PgSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_session(&self, user_id: Uuid) -> Result<Session, StoreError> {
        let client = self.pool.get().await?;
        let id = Uuid::new_v4();
        let row = client
            .query_one(
                r#"
                INSERT INTO sessions (id, user_id, created_at)
                VALUES ($1, $2, $3)
                RETURNING created_at
                "#,
                &[&id, &user_id, &Utc::now()],
            )
            .await?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|_| StoreError::MissingData("created_at".to_string()))?;

        tracing::debug!("Session {} stored for user {}", id, user_id);

        Ok(Session {
            id,
            user_id: SessionOwner::Id(user_id),
            created_at,
        })
    }

    async fn find_session_by_id(
        &self,
        id: Uuid,
        expand_user: bool,
    ) -> Result<Option<Session>, StoreError> {
        let client = self.pool.get().await?;

        if !expand_user {
            let row = client
                .query_opt(
                    "SELECT id, user_id, created_at FROM sessions WHERE id = $1",
                    &[&id],
                )
                .await?;
            return row
                .map(|r| {
                    let user_id: Uuid = r
                        .try_get("user_id")
                        .map_err(|_| StoreError::MissingData("user_id".to_string()))?;
                    let created_at: DateTime<Utc> = r
                        .try_get("created_at")
                        .map_err(|_| StoreError::MissingData("created_at".to_string()))?;
                    Ok(Session {
                        id,
                        user_id: SessionOwner::Id(user_id),
                        created_at,
                    })
                })
                .transpose();
        }

        let row = client
            .query_opt(
                r#"
                SELECT s.created_at AS session_created_at, u.*
                FROM sessions s
                JOIN users u ON u.id = s.user_id
                WHERE s.id = $1
                "#,
                &[&id],
            )
            .await?;

        row.map(|r| {
            let created_at: DateTime<Utc> = r
                .try_get("session_created_at")
                .map_err(|_| StoreError::MissingData("session_created_at".to_string()))?;
            let user = row_to_user(&r)?;
            Ok(Session {
                id,
                user_id: SessionOwner::User(Box::new(user)),
                created_at,
            })
        })
        .transpose()
    }

    async fn delete_session_by_user_id_field(&self, value: Uuid) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(
                r#"
                DELETE FROM sessions
                WHERE id = (
                    SELECT id FROM sessions
                    WHERE user_id = $1
                    ORDER BY created_at
                    LIMIT 1
                )
                "#,
                &[&value],
            )
            .await?;
        Ok(deleted)
    }

    async fn delete_session_by_id(&self, id: Uuid) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM sessions WHERE id = $1", &[&id])
            .await?;
        Ok(deleted)
    }
}
