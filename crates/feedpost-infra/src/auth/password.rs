//! Argon2id password hashing with a minimum-length policy.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use feedpost_core::ports::{AuthError, MIN_PASSWORD_LEN, PasswordService};

pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    min_length: usize,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::with_min_length(MIN_PASSWORD_LEN)
    }

    /// Length is counted in characters, not bytes.
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            argon2: Argon2::default(),
            min_length,
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn check_strength(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::WeakPassword(format!(
                "The password field must be at least {} characters.",
                self.min_length
            )));
        }
        Ok(())
    }

    fn hash(&self, password: &str) -> Result<String, AuthError> {
        self.check_strength(password)?;
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    // Login checks are policy-free: accounts predating a stricter policy
    // must still sign in.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
