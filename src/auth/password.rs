use crate::error::AppError;

/// One-way hashing of stored credentials.
pub trait PasswordHasher: Send + Sync {
    /// Produces a salted digest; the same plaintext hashes differently on each call.
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// `false` on mismatch, never an error. An unreadable digest is also a mismatch.
    fn verify(&self, hash: &str, plaintext: &str) -> bool;
}

/// bcrypt-backed hasher.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new() -> Self {
        Self::with_cost(12) // bcrypt default cost is 12
    }

    /// Lower costs are only meant for tests.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        bcrypt::hash(plaintext, self.cost)
            .map_err(|e| AppError::Hashing(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, hash: &str, plaintext: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matched) => matched,
            Err(e) => {
                log::warn!("stored password hash could not be verified: {}", e);
                false
            }
        }
    }
}
