//! User registration for Dreamboard.
//!
//! This module provides the signup request and the registration flow.

use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::auth::password::PasswordEncoder;
use crate::auth::validation::{validate_email, validate_nickname, validate_password, Violations};
use crate::db::{NewUser, Role, User, UserRepository};
use crate::{DreamboardError, Result};

/// Signup request data.
#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    /// Login email (required, at most 100 characters).
    pub email: String,
    /// Raw password (8-20 characters, mixed classes).
    pub password: String,
    /// Display nickname (2-20 Hangul syllables or ASCII letters/digits).
    pub nickname: String,
    /// Requested role; `User` when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

impl SignupRequest {
    /// Create a new signup request for a regular user.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            nickname: nickname.into(),
            role: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Validate every field, collecting all violations.
    pub fn validate(&self) -> std::result::Result<(), Violations> {
        let mut violations = Violations::new();
        violations.check("email", validate_email(&self.email));
        violations.check("password", validate_password(&self.password));
        violations.check("nickname", validate_nickname(&self.nickname));
        violations.into_result()
    }

    /// Turn the request into a `NewUser` carrying the encoded password.
    pub fn into_new_user(self, encoded_password: impl Into<String>) -> NewUser {
        NewUser::new(self.email, encoded_password, self.nickname)
            .with_role(self.role.unwrap_or_default())
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("nickname", &self.nickname)
            .field("role", &self.role)
            .finish()
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates all input fields
/// 2. Checks if the email is already registered
/// 3. Encodes the password
/// 4. Creates the user in the database
///
/// A taken email is reported as `ConstraintViolation`, both from the
/// pre-check and from the unique index if a concurrent signup wins the race.
///
/// # Examples
///
/// ```ignore
/// use dreamboard::auth::{register, Argon2PasswordEncoder, SignupRequest};
/// use dreamboard::db::{Database, UserRepository};
///
/// let db = Database::open_in_memory().await?;
/// let repo = UserRepository::new(&db);
///
/// let request = SignupRequest::new("test@example.com", "Abcd123!", "tester1");
/// let user = register(&repo, request, &Argon2PasswordEncoder::new()).await?;
/// println!("Registered user: {}", user.id());
/// ```
pub async fn register(
    repo: &UserRepository<'_>,
    request: SignupRequest,
    encoder: &dyn PasswordEncoder,
) -> Result<User> {
    request.validate()?;

    if repo.exists_by_email(&request.email).await? {
        return Err(DreamboardError::ConstraintViolation(format!(
            "email already registered: {}",
            request.email
        )));
    }

    let encoded = encoder.encode(&request.password)?;
    let user = repo.create(&request.into_new_user(encoded)).await?;

    info!(user_id = user.id(), role = %user.role(), "User registered");
    Ok(user)
}
