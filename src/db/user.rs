//! User model for Dreamboard.
//!
//! This module defines the User entity, the Role enum and the row mapping
//! used by every query that loads users.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::timestamps::Timestamps;

/// User role for permission management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member.
    #[default]
    #[serde(alias = "USER")]
    User,
    /// Administrator.
    #[serde(alias = "ADMIN")]
    Admin,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Check if this role has at least the required permission level.
    ///
    /// # Examples
    ///
    /// ```
    /// use dreamboard::db::Role;
    ///
    /// assert!(Role::Admin.can_access(Role::User));
    /// assert!(Role::User.can_access(Role::User));
    /// assert!(!Role::User.can_access(Role::Admin));
    /// ```
    pub fn can_access(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered user.
///
/// Only repositories build a `User`; the id is assigned on insert and never
/// changes. The encoded password is neither serialized nor shown by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: i64,
    email: String,
    #[serde(skip_serializing)]
    password: String,
    nickname: String,
    role: Role,
    #[serde(flatten)]
    timestamps: Timestamps,
}

impl User {
    /// Unique user ID.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Login email (unique, case-insensitive).
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Encoded password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Display name.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Role for permissions.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Audit timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Change the display name. Persist with `UserRepository::save_changes`.
    pub fn update_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    /// Replace the encoded password. Persist with `UserRepository::save_changes`.
    pub fn update_password(&mut self, encoded_password: impl Into<String>) {
        self.password = encoded_password.into();
    }

    pub(crate) fn touch(&mut self, at: chrono::DateTime<chrono::Utc>) {
        self.timestamps.touch(at);
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("nickname", &self.nickname)
            .field("role", &self.role)
            .field("timestamps", &self.timestamps)
            .finish()
    }
}

/// Data for creating a new user.
#[derive(Clone)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Password, already encoded.
    pub password: String,
    /// Display name.
    pub nickname: String,
    /// User role (defaults to User).
    pub role: Role,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(
        email: impl Into<String>,
        encoded_password: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: encoded_password.into(),
            nickname: nickname.into(),
            role: Role::default(),
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("nickname", &self.nickname)
            .field("role", &self.role)
            .finish()
    }
}

/// Column list for selecting a user under `alias`, each column renamed
/// with `prefix` (for joins).
pub(crate) fn user_columns(alias: &str, prefix: &str) -> String {
    ["id", "email", "password", "nickname", "role", "created_at", "updated_at"]
        .iter()
        .map(|col| format!("{alias}.{col} AS {prefix}{col}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Database row type for User.
#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    email: String,
    password: String,
    nickname: String,
    role: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    /// Decode a user selected with [`user_columns`] and `prefix`.
    pub(crate) fn from_prefixed(row: &SqliteRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let col = |name: &str| format!("{prefix}{name}");
        Ok(Self {
            id: row.try_get(col("id").as_str())?,
            email: row.try_get(col("email").as_str())?,
            password: row.try_get(col("password").as_str())?,
            nickname: row.try_get(col("nickname").as_str())?,
            role: row.try_get(col("role").as_str())?,
            created_at: row.try_get(col("created_at").as_str())?,
            updated_at: row.try_get(col("updated_at").as_str())?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamps: Timestamps::from_stored(&row.created_at, &row.updated_at)?,
            id: row.id,
            email: row.email,
            password: row.password,
            nickname: row.nickname,
            role: row.role.parse().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_user(id: i64, role: Role) -> User {
    User {
        id,
        email: format!("user{id}@example.com"),
        password: "encoded".to_string(),
        nickname: format!("user{id}"),
        role,
        timestamps: Timestamps::created(chrono::Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("sysop").is_err());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(format!("{}", Role::Admin), "admin");
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("test@example.com", "hash", "tester").with_role(Role::Admin);

        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.password, "hash");
        assert_eq!(user.nickname, "tester");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_new_user_defaults_to_user_role() {
        let user = NewUser::new("test@example.com", "hash", "tester");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_mutators() {
        let mut user = sample_user(1, Role::User);
        user.update_nickname("renamed");
        user.update_password("newhash");

        assert_eq!(user.nickname(), "renamed");
        assert_eq!(user.password(), "newhash");
        assert_eq!(user.id(), 1);
    }

    #[test]
    fn test_debug_redacts_password() {
        let user = sample_user(1, Role::User);
        let debug = format!("{user:?}");
        assert!(!debug.contains("encoded"));
        assert!(debug.contains("[redacted]"));

        let new_user = NewUser::new("a@example.com", "secret-hash", "nick");
        assert!(!format!("{new_user:?}").contains("secret-hash"));
    }

    #[test]
    fn test_serialize_skips_password() {
        let user = sample_user(7, Role::Admin);
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["email"], "user7@example.com");
        assert!(json.get("created_at").is_some());
        assert!(json.get("updated_at").is_some());
    }

    #[test]
    fn test_user_columns() {
        let cols = user_columns("u", "author_");
        assert!(cols.starts_with("u.id AS author_id, u.email AS author_email"));
        assert!(cols.ends_with("u.updated_at AS author_updated_at"));
    }

    #[test]
    fn test_row_with_unknown_role_defaults() {
        let row = UserRow {
            id: 1,
            email: "a@example.com".to_string(),
            password: "hash".to_string(),
            nickname: "nick".to_string(),
            role: "superuser".to_string(),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
        };
        let user = User::try_from(row).unwrap();
        assert_eq!(user.role(), Role::User);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_can_access() {
        assert!(Role::Admin.can_access(Role::User));
        assert!(!Role::User.can_access(Role::Admin));
    }
}
