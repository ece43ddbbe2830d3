use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hasher with a fixed work factor. Hashes are PHC strings, so
/// verification reads the parameters back from the stored hash.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
    /// Hash with the configured params, verified against when no user matches.
    dummy_hash: String,
}

impl Hasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash("nextbi-unknown-account")?;
        Ok(hasher)
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on a wrong password; `Err` only when the stored hash is unusable.
    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(anyhow::anyhow!(e.to_string()))
            }
        }
    }

    /// Runs a full verification against the dummy hash and discards the result,
    /// so a login for an unknown email costs the same as a wrong password.
    pub fn verify_dummy(&self, plain: &str) {
        let _ = self.verify(plain, &self.dummy_hash);
    }
}

#[cfg(test)]
pub(crate) fn cheap_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}
