use std::sync::Arc;

use crate::config::Config;
use crate::crypto::password::CredentialHasher;
use crate::error::Result;
use crate::repositories::{
    memory::MemoryStore,
    session::{PgSessionStore, SessionStore},
    user::{PgUserStore, UserStore},
};
use crate::services::auth::{AuthService, LogoutMatch};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The authentication service.
    pub auth: AuthService,
}

impl AppState {
    /// Creates a new `AppState`, connecting to PostgreSQL when a database URL
    /// is configured and falling back to the in-memory store otherwise.
    pub async fn new(config: &Config) -> Result<Self> {
        let (users, sessions): (Arc<dyn UserStore>, Arc<dyn SessionStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = crate::db::create_pool(url, config.database_pool_size)?;
                    crate::db::run_migrations(&pool).await?;
                    tracing::info!("✅ PostgreSQL pool initialized and schema applied");
                    (
                        Arc::new(PgUserStore::new(pool.clone())),
                        Arc::new(PgSessionStore::new(pool)),
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, using the in-memory store");
                    let store = MemoryStore::new();
                    (Arc::new(store.clone()), Arc::new(store))
                }
            };

        Self::with_stores(config, users, sessions)
    }

    /// Builds the state around already-constructed stores.
    pub fn with_stores(
        config: &Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let hasher = CredentialHasher::new(config.hasher)?;
        let logout_match = if config.logout_by_session_id {
            LogoutMatch::SessionId
        } else {
            LogoutMatch::UserIdField
        };
        tracing::info!("✅ Credential hasher ready, logout matches {:?}", logout_match);

        Ok(AppState {
            config: config.clone(),
            auth: AuthService::new(users, sessions, hasher, logout_match),
        })
    }
}
