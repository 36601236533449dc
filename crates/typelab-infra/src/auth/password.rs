//! Argon2 password hashing with a minimum-length policy.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use typelab_core::ports::{AuthError, PasswordService};

/// Shortest password accepted at sign-up, in characters.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Argon2id password service. Refuses to hash passwords shorter than
/// `min_length`; verification is unaffected so older accounts can still sign in.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    min_length: usize,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::with_min_length(DEFAULT_MIN_PASSWORD_LEN)
    }

    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            argon2: Argon2::default(),
            min_length,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::WeakPassword(self.min_length));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hashed = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(hashed.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}
