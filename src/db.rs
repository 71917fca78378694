use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::{config::Host, NoTls};
use crate::error::{AppError, Result, StoreError};
use std::time::Duration;

const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Builds the deadpool configuration for a PostgreSQL URL or key/value
/// connection string.
pub fn pool_config(database_url: &str, max_size: usize) -> Result<Config> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| AppError::Store(StoreError::Postgres(e)))?;

    match pg_config.get_hosts().first() {
        Some(Host::Tcp(hostname)) => cfg.host = Some(hostname.clone()),
        // A host starting with '/' is read back as a socket directory.
        #[cfg(unix)]
        Some(Host::Unix(path)) => cfg.host = Some(path.to_string_lossy().into_owned()),
        None => {}
    }

    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..Default::default()
    });

    Ok(cfg)
}

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
/// * `max_size` - The maximum number of pooled connections.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str, max_size: usize) -> Result<Pool> {
    pool_config(database_url, max_size)?
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| AppError::Internal(format!("Failed to create pool: {}", e)))
}

/// Applies the schema. Every statement is idempotent.
pub async fn run_migrations(pool: &Pool) -> Result<()> {
    let client = pool.get().await.map_err(StoreError::from)?;
    client
        .batch_execute(INIT_SCHEMA)
        .await
        .map_err(StoreError::from)?;
    Ok(())
}
