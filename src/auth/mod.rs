//! Authentication module for Dreamboard.
//!
//! This module provides password encoding, input validation, user
//! registration, login and profile updates.

mod login;
mod password;
mod profile;
mod registration;
pub mod validation;

pub use login::{authenticate, LoginRequest};
pub use password::{Argon2PasswordEncoder, PasswordEncoder, PasswordError};
pub use profile::{update_user, UserUpdateRequest};
pub use registration::{register, SignupRequest};
pub use validation::{FieldViolation, ValidationError, Violations};

#[cfg(test)]
pub(crate) use password::test_encoder;
