use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::config::HasherConfig;
use crate::error::{AppError, Result};

/// Salted one-way password hashing with a fixed Argon2id cost.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Creates a hasher with the given cost parameters.
    pub fn new(config: HasherConfig) -> Result<Self> {
        let params = ParamsBuilder::new()
            .m_cost(config.memory_kib)
            .t_cost(config.iterations)
            .p_cost(config.parallelism)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hashes a password into a PHC string.
    ///
    /// # Arguments
    ///
    /// * `password` - The plaintext password.
    ///
    /// # Returns
    ///
    /// A `Result` containing the encoded hash.
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut password_bytes = password.as_bytes().to_vec();

        let mut salt_bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| AppError::Internal(format!("Failed to generate salt: {}", e)))?;

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

        let hashed = self
            .argon2()
            .hash_password(&password_bytes, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)));

        password_bytes.zeroize();
        hashed
    }

    /// Checks a password against a stored hash. A malformed hash never
    /// verifies.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        let mut password_bytes = password.as_bytes().to_vec();
        let matches = self
            .argon2()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok();
        password_bytes.zeroize();
        matches
    }

    /// Runs [`CredentialHasher::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, mut password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let hashed = hasher.hash(&password);
            password.zeroize();
            hashed
        })
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Runs [`CredentialHasher::verify`] on the blocking pool.
    pub async fn verify_blocking(&self, mut password: String, hash: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let matches = hasher.verify(&password, &hash);
            password.zeroize();
            matches
        })
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HasherConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
