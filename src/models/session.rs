use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::user::User;

/// The owning-user reference of a session, either as a bare id or resolved
/// to the full user record.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum SessionOwner {
    Id(Uuid),
    User(Box<User>),
}

impl SessionOwner {
    /// The id of the owning user, whether or not it has been expanded.
    pub fn user_id(&self) -> Uuid {
        match self {
            SessionOwner::Id(id) => *id,
            SessionOwner::User(user) => user.id,
        }
    }
}

/// Represents one authenticated login. The session id is the bearer token
/// handed to the client.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The ID of the session, also the access token.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: SessionOwner,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
}
