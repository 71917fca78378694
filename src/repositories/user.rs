use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use tokio_postgres::{error::SqlState, Row};
use uuid::Uuid;

use crate::{
    error::StoreError,
    models::user::{NewUser, User},
};

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user. Schema violations surface as `StoreError::Validation`,
    /// a reused email as `StoreError::DuplicateKey`.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Finds a user by their email address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
pub(crate) fn row_to_user(row: &Row) -> Result<User, StoreError> {
    fn get<'a, T: tokio_postgres::types::FromSql<'a>>(
        row: &'a Row,
        column: &str,
    ) -> Result<T, StoreError> {
        row.try_get(column)
            .map_err(|_| StoreError::MissingData(column.to_string()))
    }

    Ok(User {
        id: get(row, "id")?,
        first_name: get(row, "first_name")?,
        last_name: get(row, "last_name")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        address: get(row, "address")?,
        about: get(row, "about")?,
        image_url: get(row, "image_url")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        new_user.check_schema().map_err(StoreError::Validation)?;

        let client = self.pool.get().await?;
        let user = new_user.into_user(Uuid::new_v4(), Utc::now());
        let row = client
            .query_one(
                r#"
                INSERT INTO users
                    (id, first_name, last_name, email, password_hash, address, about,
                     image_url, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
                &[
                    &user.id,
                    &user.first_name,
                    &user.last_name,
                    &user.email,
                    &user.password_hash,
                    &user.address,
                    &user.about,
                    &user.image_url,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    StoreError::DuplicateKey(format!("email {:?} already exists", user.email))
                } else {
                    StoreError::Postgres(e)
                }
            })?;
        row_to_user(&row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM users
                WHERE email = $1
                "#,
                &[&email],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }
}
