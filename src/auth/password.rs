use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::config::PasswordConfig;
use crate::error::AppError;

const MAX_PASSWORD_BYTES: usize = 1024;

/// Argon2id hashing with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash checked against when the account does not exist.
    absent: String,
    #[cfg(test)]
    pub(crate) checks: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, AppError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| AppError::Internal(format!("invalid argon2 parameters: {e}")))?;
        let mut hasher = Self {
            params,
            absent: String::new(),
            #[cfg(test)]
            checks: Default::default(),
        };
        hasher.absent = hasher
            .hash("no-such-account")
            .map_err(|e| AppError::Internal(format!("placeholder hash failed: {e}")))?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        validate_password(password)?;
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::CredentialFormat(e.to_string()))
    }

    /// `false` for a wrong password and for any malformed input.
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        self.check(password, hashed).is_ok()
    }

    /// Like [`verify`](Self::verify) but keeps malformed input apart from a mismatch.
    pub fn check(&self, password: &str, hashed: &str) -> Result<(), AppError> {
        #[cfg(test)]
        self.checks
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        validate_password(password)?;
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| AppError::CredentialFormat(format!("stored hash: {e}")))?;

        // The hash carries its own parameters, so older cost settings still verify.
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(AppError::CredentialMismatch),
            Err(e) => Err(AppError::CredentialFormat(e.to_string())),
        }
    }

    /// Same work as [`check`](Self::check) for an account that does not exist.
    /// `CredentialFormat` for bad input, otherwise `CredentialMismatch`.
    pub fn check_absent(&self, password: &str) -> AppError {
        match self.check(password, &self.absent) {
            Err(e @ AppError::CredentialFormat(_)) => e,
            _ => AppError::CredentialMismatch,
        }
    }
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::CredentialFormat("empty password".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::CredentialFormat("password too long".to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
