use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The URL of the PostgreSQL database. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// The maximum number of pooled PostgreSQL connections.
    pub database_pool_size: usize,
    /// Cost parameters for the credential hasher.
    pub hasher: HasherConfig,
    /// Delete sessions by their own id on logout instead of by the user field.
    pub logout_by_session_id: bool,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

/// Argon2 cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = HasherConfig::default();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr: parse_var("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 5005)))?,
            database_url,
            database_pool_size: parse_var("DATABASE_POOL_SIZE", 16)?,
            hasher: HasherConfig {
                memory_kib: parse_var("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_var("ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: parse_var("ARGON2_PARALLELISM", defaults.parallelism)?,
            },
            logout_by_session_id: parse_var("LOGOUT_BY_SESSION_ID", false)?,
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hasher_cost() {
        let cfg = HasherConfig::default();
        assert_eq!(cfg.memory_kib, 19456);
        assert_eq!(cfg.iterations, 3);
        assert_eq!(cfg.parallelism, 1);
    }

    #[test]
    fn parse_var_falls_back_to_default() {
        let value: u32 = parse_var("GATEKEEP_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
