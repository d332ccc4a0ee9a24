//! Password encoding for Dreamboard.
//!
//! Services take any [`PasswordEncoder`]; [`Argon2PasswordEncoder`] is the
//! implementation used by the binary.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;
use thiserror::Error;

/// Password-related errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),

    /// Argon2 parameters were rejected.
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// One-way password encoding.
pub trait PasswordEncoder: Send + Sync {
    /// Encode a raw password for storage.
    fn encode(&self, raw: &str) -> Result<String, PasswordError>;

    /// Check a raw password against an encoded one.
    ///
    /// A malformed encoded value never matches.
    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

/// Argon2id encoder producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone)]
pub struct Argon2PasswordEncoder {
    params: Params,
}

impl Argon2PasswordEncoder {
    /// Encoder with the argon2 crate's default cost (19 MiB, 2 passes, 1 lane).
    pub fn new() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }

    /// Encoder with explicit cost parameters.
    ///
    /// `m_cost` is in KiB.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };
        // Cost parameters are read from the stored hash.
        Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn test_encoder() -> Argon2PasswordEncoder {
    Argon2PasswordEncoder::with_params(1024, 1, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_phc_string() {
        let encoded = test_encoder().encode("Abcd123!").unwrap();
        assert!(encoded.starts_with("$argon2id$"));
        assert!(encoded.contains("$v=19$"));
        assert_ne!(encoded, "Abcd123!");
    }

    #[test]
    fn test_encode_is_salted() {
        let encoder = test_encoder();
        let a = encoder.encode("Abcd123!").unwrap();
        let b = encoder.encode("Abcd123!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_matches() {
        let encoder = test_encoder();
        let encoded = encoder.encode("Abcd123!").unwrap();

        assert!(encoder.matches("Abcd123!", &encoded));
        assert!(!encoder.matches("abcd123!", &encoded));
        assert!(!encoder.matches("", &encoded));
    }

    #[test]
    fn test_matches_malformed_hash() {
        assert!(!test_encoder().matches("Abcd123!", "not-a-hash"));
        assert!(!test_encoder().matches("Abcd123!", ""));
    }

    #[test]
    fn test_verify_across_encoders() {
        let encoded = test_encoder().encode("Xyz98765?").unwrap();
        assert!(Argon2PasswordEncoder::new().matches("Xyz98765?", &encoded));
    }

    #[test]
    fn test_invalid_params() {
        let result = Argon2PasswordEncoder::with_params(1, 0, 0);
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
