//! Login for Dreamboard.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::password::PasswordEncoder;
use crate::auth::validation::{validate_email, validate_login_password, Violations};
use crate::db::{User, UserRepository};
use crate::{DreamboardError, Result};

/// Message for every failed login, so callers cannot probe which emails exist.
const BAD_CREDENTIALS: &str = "invalid email or password";

/// Login request data.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Raw password.
    pub password: String,
}

impl LoginRequest {
    /// Create a new login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Validate every field, collecting all violations.
    pub fn validate(&self) -> std::result::Result<(), Violations> {
        let mut violations = Violations::new();
        violations.check("email", validate_email(&self.email));
        violations.check("password", validate_login_password(&self.password));
        violations.into_result()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Check credentials and return the matching user.
///
/// An unknown email and a wrong password fail with the same `Auth` error.
pub async fn authenticate(
    repo: &UserRepository<'_>,
    request: LoginRequest,
    encoder: &dyn PasswordEncoder,
) -> Result<User> {
    request.validate()?;

    let Some(user) = repo.find_by_email(&request.email).await? else {
        debug!("Login failed: unknown email");
        return Err(DreamboardError::Auth(BAD_CREDENTIALS.to_string()));
    };

    if !encoder.matches(&request.password, user.password()) {
        debug!(user_id = user.id(), "Login failed: wrong password");
        return Err(DreamboardError::Auth(BAD_CREDENTIALS.to_string()));
    }

    info!(user_id = user.id(), "User authenticated");
    Ok(user)
}
