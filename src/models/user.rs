use chrono::{DateTime, Utc};
use garde::Validate;
use serde::Serialize;
use uuid::Uuid;

/// Represents a registered account.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// The user's email address. Unique across all users.
    pub email: String,
    /// The user's hashed password. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub address: String,
    pub about: String,
    /// Reference to an uploaded profile image.
    pub image_url: Option<String>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The fields a store needs to create a [`User`]. Validated against the user
/// schema before insertion.
#[derive(Validate, Clone, Debug)]
pub struct NewUser {
    #[garde(length(chars, min = 1, max = 20))]
    pub first_name: String,
    #[garde(length(chars, min = 1, max = 20))]
    pub last_name: String,
    #[garde(length(min = 1))]
    pub email: String,
    #[garde(length(min = 6))]
    pub password_hash: String,
    #[garde(length(chars, min = 1, max = 30))]
    pub address: String,
    #[garde(length(chars, min = 1, max = 200))]
    pub about: String,
    #[garde(skip)]
    pub image_url: Option<String>,
}

impl NewUser {
    /// Checks the user schema, returning one human-readable message that
    /// lists every offending field.
    pub fn check_schema(&self) -> Result<(), String> {
        self.validate().map_err(|report| {
            let problems: Vec<String> = report
                .iter()
                .map(|(path, error)| format!("{}: {}", path, error))
                .collect();
            format!("User validation failed: {}", problems.join(", "))
        })
    }

    /// Materializes the record with a store-assigned id and timestamps.
    pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            address: self.address,
            about: self.about,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        }
    }
}
