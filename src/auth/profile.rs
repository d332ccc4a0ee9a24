//! User profile updates for Dreamboard.
//!
//! This module provides changing a user's nickname and password.

use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::auth::password::PasswordEncoder;
use crate::auth::validation::{validate_nickname, validate_password, Violations};
use crate::db::{User, UserRepository};
use crate::{DreamboardError, Result};

/// Profile update request; absent fields are left unchanged.
#[derive(Clone, Default, Deserialize)]
pub struct UserUpdateRequest {
    /// New nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// New raw password.
    #[serde(default)]
    pub password: Option<String>,
}

impl UserUpdateRequest {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new nickname.
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Set new password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.password.is_none()
    }

    /// Validate the present fields with the signup rules.
    pub fn validate(&self) -> std::result::Result<(), Violations> {
        let mut violations = Violations::new();
        if let Some(ref nickname) = self.nickname {
            violations.check("nickname", validate_nickname(nickname));
        }
        if let Some(ref password) = self.password {
            violations.check("password", validate_password(password));
        }
        violations.into_result()
    }

    /// Apply the present fields to `user` through its mutators, encoding a
    /// new password on the way.
    pub fn apply_to(&self, user: &mut User, encoder: &dyn PasswordEncoder) -> Result<()> {
        if let Some(ref nickname) = self.nickname {
            user.update_nickname(nickname.as_str());
        }
        if let Some(ref password) = self.password {
            user.update_password(encoder.encode(password)?);
        }
        Ok(())
    }
}

impl fmt::Debug for UserUpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdateRequest")
            .field("nickname", &self.nickname)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Update a user's profile.
///
/// Validates the request, loads the user (`NotFound` if absent), applies the
/// present fields and saves. An empty request returns the stored user
/// without writing.
pub async fn update_user(
    repo: &UserRepository<'_>,
    user_id: i64,
    request: UserUpdateRequest,
    encoder: &dyn PasswordEncoder,
) -> Result<User> {
    request.validate()?;

    let mut user = repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DreamboardError::NotFound("user".to_string()))?;

    if request.is_empty() {
        return Ok(user);
    }

    request.apply_to(&mut user, encoder)?;
    repo.save_changes(&mut user).await?;

    info!(
        user_id,
        nickname_changed = request.nickname.is_some(),
        password_changed = request.password.is_some(),
        "User profile updated"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_encoder;
    use crate::auth::validation::ValidationError;
    use crate::db::{sample_user, Database, NewUser, Role};

    #[test]
    fn test_empty_request() {
        let request = UserUpdateRequest::new();
        assert!(request.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_present_fields_only() {
        assert!(UserUpdateRequest::new().nickname("새이름").validate().is_ok());

        let violations = UserUpdateRequest::new()
            .nickname("!")
            .password("weakpass")
            .validate()
            .unwrap_err();
        assert_eq!(
            violations.get("nickname"),
            Some(&ValidationError::NicknameTooShort)
        );
        assert_eq!(
            violations.get("password"),
            Some(&ValidationError::PasswordMissingUppercase)
        );
    }

    #[test]
    fn test_apply_to() {
        let encoder = test_encoder();
        let mut user = sample_user(1, Role::User);

        UserUpdateRequest::new()
            .nickname("renamed")
            .apply_to(&mut user, &encoder)
            .unwrap();
        assert_eq!(user.nickname(), "renamed");
        assert_eq!(user.password(), "encoded");

        UserUpdateRequest::new()
            .password("Newpass1!")
            .apply_to(&mut user, &encoder)
            .unwrap();
        assert!(encoder.matches("Newpass1!", user.password()));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", UserUpdateRequest::new().password("Newpass1!"));
        assert!(!debug.contains("Newpass1!"));
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);
        let encoder = test_encoder();
        let created = repo
            .create(&NewUser::new("a@example.com", "encoded", "before"))
            .await
            .unwrap();

        let updated = update_user(
            &repo,
            created.id(),
            UserUpdateRequest::new().nickname("after").password("Newpass1!"),
            &encoder,
        )
        .await
        .unwrap();

        let stored = repo.find_by_id(created.id()).await.unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.nickname(), "after");
        assert!(encoder.matches("Newpass1!", stored.password()));
        assert!(stored.timestamps().updated_at() > created.timestamps().updated_at());
        assert_eq!(
            stored.timestamps().created_at(),
            created.timestamps().created_at()
        );
    }

    #[tokio::test]
    async fn test_empty_update_leaves_user_unchanged() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);
        let created = repo
            .create(&NewUser::new("a@example.com", "encoded", "before"))
            .await
            .unwrap();

        let result = update_user(&repo, created.id(), UserUpdateRequest::new(), &test_encoder())
            .await
            .unwrap();

        assert_eq!(result, created);
        let stored = repo.find_by_id(created.id()).await.unwrap().unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);

        let err = update_user(
            &repo,
            42,
            UserUpdateRequest::new().nickname("ghost"),
            &test_encoder(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
