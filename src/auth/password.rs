use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hashing with a fixed, configured cost.
pub struct Passwords {
    argon2: Argon2<'static>,
    /// Verified against when the account does not exist, so a miss costs
    /// the same as a wrong password.
    dummy_hash: String,
}

impl Passwords {
    pub fn from_config(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut passwords = Self {
            argon2,
            dummy_hash: String::new(),
        };
        passwords.dummy_hash = passwords.hash("exoai-dummy-Passw0rd")?;
        Ok(passwords)
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

    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn verify_dummy(&self, plain: &str) -> anyhow::Result<()> {
        self.verify(plain, &self.dummy_hash).map(|_| ())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passwords() -> Passwords {
        Passwords::from_config(&test_config()).expect("params are valid")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let passwords = passwords();
        let hash = passwords.hash("Secur3P@ss").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("Secur3P@ss", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let passwords = passwords();
        let hash = passwords.hash("Abcdef1").expect("hashing should succeed");
        assert!(!passwords.verify("Abcdef2", &hash).expect("verify should not error"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let passwords = passwords();
        let a = passwords.hash("Abcdef1").unwrap();
        let b = passwords.hash("Abcdef1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn dummy_check_runs_a_real_verification() {
        let passwords = passwords();
        assert!(passwords.dummy_hash.starts_with("$argon2id$"));
        passwords.verify_dummy("whatever").expect("dummy hash parses");
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = passwords().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn rejects_impossible_params() {
        let cfg = PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(Passwords::from_config(&cfg).is_err());
    }
}
