use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::{
    crypto::password::CredentialHasher,
    error::{AppError, Result, StoreError},
    models::{session::Session, user::{NewUser, User}},
    repositories::{session::SessionStore, user::UserStore},
    validation::auth::{validate_login_presence, validate_password, validate_signup_presence},
};

pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "Username and email need to be unique. Either last name or email is already used.";
pub const EMAIL_NOT_REGISTERED_MESSAGE: &str = "Email is not registered. Try with other email.";
pub const INCORRECT_PASSWORD_MESSAGE: &str = "Incorrect password.";
pub const SESSION_NOT_FOUND_MESSAGE: &str = "Session does not exist";
pub const LOGOUT_MESSAGE: &str = "User was logged out";

/// A scalar form value. Numbers and booleans are accepted where text is
/// expected and rendered as their decimal or literal text.
#[derive(Deserialize)]
#[serde(untagged)]
enum FormScalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl FormScalar {
    fn into_text(self) -> String {
        match self {
            FormScalar::Text(text) => text,
            FormScalar::Integer(n) => n.to_string(),
            FormScalar::Float(n) => n.to_string(),
            FormScalar::Flag(b) => b.to_string(),
        }
    }
}

/// `null` becomes `None`, any scalar becomes its text.
fn optional_form_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FormScalar>::deserialize(deserializer)?.map(FormScalar::into_text))
}

/// Like [`optional_form_text`], with `null` read as an empty string.
fn form_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_form_text(deserializer)?.unwrap_or_default())
}

/// Signup form fields. Absent or `null` fields deserialize as empty strings.
#[derive(Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    #[serde(deserialize_with = "form_text")]
    pub first_name: String,
    #[serde(deserialize_with = "form_text")]
    pub last_name: String,
    #[serde(deserialize_with = "form_text")]
    pub email: String,
    #[serde(deserialize_with = "form_text")]
    pub password: String,
    #[serde(deserialize_with = "form_text")]
    pub address: String,
    #[serde(deserialize_with = "form_text")]
    pub about: String,
    #[serde(deserialize_with = "optional_form_text")]
    pub image_url: Option<String>,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("address", &self.address)
            .field("about", &self.about)
            .field("image_url", &self.image_url)
            .finish()
    }
}

/// Login form fields. An absent or `null` field is `None`, which is not the
/// same as an empty one.
#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "optional_form_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "optional_form_text")]
    pub password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Returned by a successful signup or login.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// The id of the freshly created session.
    pub access_token: Uuid,
    pub user: User,
}

/// Returned by logout.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LogoutPayload {
    pub success: &'static str,
    pub deleted_count: u64,
}

/// Which session field a logout token is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutMatch {
    /// Match the token against the session's user reference.
    UserIdField,
    /// Match the token against the session's own id.
    SessionId,
}

/// Orchestrates signup, login, logout and session lookup. Holds no state
/// between calls beyond its injected collaborators.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: CredentialHasher,
    logout_match: LogoutMatch,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: CredentialHasher,
        logout_match: LogoutMatch,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            logout_match,
        }
    }

    /// Registers a user and opens a first session for them.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthPayload> {
        let SignupRequest {
            first_name,
            last_name,
            email,
            mut password,
            address,
            about,
            image_url,
        } = request;

        if let Err(e) = validate_signup_presence(&last_name, &email, &password)
            .and_then(|_| validate_password(&password))
        {
            password.zeroize();
            return Err(e);
        }

        tracing::debug!("🔐 Creating user: {}", email);
        let password_hash = self.hasher.hash_blocking(password).await?;

        let new_user = NewUser {
            first_name,
            last_name,
            email,
            password_hash,
            address,
            about,
            image_url,
        };

        let user = match self.users.create_user(new_user).await {
            Ok(user) => user,
            Err(StoreError::Validation(message)) => return Err(AppError::UserInput(message)),
            Err(StoreError::DuplicateKey(detail)) => {
                tracing::info!("Signup rejected, {}", detail);
                return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("✅ User created with ID: {}", user.id);

        let session = self.sessions.create_session(user.id).await?;
        tracing::info!("✅ Session {} opened for user {}", session.id, user.id);

        Ok(AuthPayload {
            access_token: session.id,
            user,
        })
    }

    /// Checks credentials and opens a new session.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthPayload> {
        let LoginRequest { email, password } = request;

        let presence = validate_login_presence(email.as_deref(), password.as_deref());
        let mut password = password.unwrap_or_default();
        if let Err(e) = presence {
            password.zeroize();
            return Err(e);
        }

        // Without an email there is nothing to look up.
        let Some(email) = email else {
            password.zeroize();
            return Err(AppError::NotFound(EMAIL_NOT_REGISTERED_MESSAGE.to_string()));
        };

        tracing::debug!("🔐 Authenticating user: {}", email);

        let user = match self.users.find_user_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                password.zeroize();
                return Err(AppError::NotFound(EMAIL_NOT_REGISTERED_MESSAGE.to_string()));
            }
            Err(e) => {
                password.zeroize();
                return Err(e.into());
            }
        };

        if !self
            .hasher
            .verify_blocking(password, user.password_hash.clone())
            .await?
        {
            return Err(AppError::Authentication(
                INCORRECT_PASSWORD_MESSAGE.to_string(),
            ));
        }

        let session = self.sessions.create_session(user.id).await?;
        tracing::info!("✅ User authenticated: {}", user.id);

        Ok(AuthPayload {
            access_token: session.id,
            user,
        })
    }

    /// Deletes the session(s) matched by `access_token`. Always succeeds unless
    /// the store fails; an unknown or malformed token deletes nothing.
    pub async fn logout(&self, access_token: &str) -> Result<LogoutPayload> {
        let deleted_count = match Uuid::parse_str(access_token.trim()) {
            Ok(token) => match self.logout_match {
                LogoutMatch::UserIdField => {
                    self.sessions.delete_session_by_user_id_field(token).await?
                }
                LogoutMatch::SessionId => self.sessions.delete_session_by_id(token).await?,
            },
            Err(_) => {
                tracing::debug!("Logout with malformed token, nothing to delete");
                0
            }
        };

        tracing::info!("👋 Logout removed {} session(s)", deleted_count);

        Ok(LogoutPayload {
            success: LOGOUT_MESSAGE,
            deleted_count,
        })
    }

    /// Looks up a session with its owning user expanded.
    pub async fn get_session(&self, access_token: &str) -> Result<Session> {
        let not_found = || AppError::NotFound(SESSION_NOT_FOUND_MESSAGE.to_string());

        let id = Uuid::parse_str(access_token.trim()).map_err(|_| not_found())?;
        self.sessions
            .find_session_by_id(id, true)
            .await?
            .ok_or_else(not_found)
    }
}
