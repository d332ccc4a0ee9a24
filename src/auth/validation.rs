//! Input validation for Dreamboard requests.
//!
//! Each `validate_*` function checks one field and reports the first rule
//! it breaks. Request types collect the results of all their fields into
//! [`Violations`], so a caller sees every bad field at once.

use std::fmt;

use thiserror::Error;
use validator::ValidateEmail;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 100;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 20;

/// Minimum nickname length.
pub const MIN_NICKNAME_LENGTH: usize = 2;

/// Maximum nickname length.
pub const MAX_NICKNAME_LENGTH: usize = 20;

/// Maximum board title length.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum comment length.
pub const MAX_COMMENT_LENGTH: usize = 500;

/// Special characters accepted (and one required) in passwords.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email is missing.
    #[error("email is required")]
    EmailRequired,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Password is missing.
    #[error("password is required")]
    PasswordRequired,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    /// Password has a character outside letters, digits and the specials.
    #[error("password may only contain letters, digits and {PASSWORD_SPECIALS}")]
    PasswordInvalidChars,

    /// Password lacks a lowercase letter.
    #[error("password must contain a lowercase letter")]
    PasswordMissingLowercase,

    /// Password lacks an uppercase letter.
    #[error("password must contain an uppercase letter")]
    PasswordMissingUppercase,

    /// Password lacks a digit.
    #[error("password must contain a digit")]
    PasswordMissingDigit,

    /// Password lacks a special character.
    #[error("password must contain one of {PASSWORD_SPECIALS}")]
    PasswordMissingSpecial,

    /// Nickname is missing.
    #[error("nickname is required")]
    NicknameRequired,

    /// Nickname is too short.
    #[error("nickname must be at least {MIN_NICKNAME_LENGTH} characters")]
    NicknameTooShort,

    /// Nickname is too long.
    #[error("nickname must be at most {MAX_NICKNAME_LENGTH} characters")]
    NicknameTooLong,

    /// Nickname contains invalid characters.
    #[error("nickname may only contain Hangul syllables, letters and digits")]
    NicknameInvalidChars,

    /// Title is missing.
    #[error("title is required")]
    TitleRequired,

    /// Title is too long.
    #[error("title must be at most {MAX_TITLE_LENGTH} characters")]
    TitleTooLong,

    /// Content is missing.
    #[error("content is required")]
    ContentRequired,

    /// Comment is too long.
    #[error("comment must be at most {MAX_COMMENT_LENGTH} characters")]
    CommentTooLong,
}

/// A rule broken by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field name as it appears in the request.
    pub field: &'static str,
    /// The broken rule.
    pub error: ValidationError,
}

impl FieldViolation {
    /// Create a violation.
    pub fn new(field: &'static str, error: ValidationError) -> Self {
        Self { field, error }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Every field violation found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a violation.
    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    /// Record the outcome of validating `field`.
    pub fn check(&mut self, field: &'static str, result: Result<(), ValidationError>) {
        if let Err(error) = result {
            self.push(FieldViolation::new(field, error));
        }
    }

    /// Check if no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over violations in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.0.iter()
    }

    /// The error recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|v| v.field == field).map(|v| &v.error)
    }

    /// `Ok(())` if empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Validate an email address.
///
/// Requirements:
/// - Not blank
/// - Length: at most 100 characters
/// - Well-formed address
///
/// # Examples
///
/// ```
/// use dreamboard::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("").is_err());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if !email.to_owned().validate_email() {
        return Err(ValidationError::EmailInvalidFormat);
    }
    Ok(())
}

/// Validate a password chosen at signup or on change.
///
/// Requirements:
/// - Length: 8-20 characters
/// - Only ASCII letters, digits and `@$!%*?&`
/// - At least one lowercase letter, uppercase letter, digit and special
///
/// # Examples
///
/// ```
/// use dreamboard::auth::validation::validate_password;
///
/// assert!(validate_password("Abcd123!").is_ok());
/// assert!(validate_password("abcd1234").is_err()); // no uppercase, no special
/// ```
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
    {
        return Err(ValidationError::PasswordInvalidChars);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(ValidationError::PasswordMissingSpecial);
    }

    Ok(())
}

/// Validate a password typed at login: only presence is checked.
pub fn validate_login_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}

fn is_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Validate a nickname.
///
/// Requirements:
/// - Length: 2-20 characters
/// - Characters: Hangul syllables (가-힣) and ASCII letters/digits
///
/// # Examples
///
/// ```
/// use dreamboard::auth::validation::validate_nickname;
///
/// assert!(validate_nickname("tester1").is_ok());
/// assert!(validate_nickname("홍길동").is_ok());
/// assert!(validate_nickname("a").is_err()); // too short
/// assert!(validate_nickname("no spaces").is_err());
/// ```
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.trim().is_empty() {
        return Err(ValidationError::NicknameRequired);
    }

    let len = nickname.chars().count();
    if len < MIN_NICKNAME_LENGTH {
        return Err(ValidationError::NicknameTooShort);
    }
    if len > MAX_NICKNAME_LENGTH {
        return Err(ValidationError::NicknameTooLong);
    }

    if !nickname.chars().all(is_nickname_char) {
        return Err(ValidationError::NicknameInvalidChars);
    }

    Ok(())
}

/// Validate a board title: not blank, at most 200 characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Validate board content: not blank.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::ContentRequired);
    }
    Ok(())
}

/// Validate comment text: not blank, at most 500 characters.
pub fn validate_comment(content: &str) -> Result<(), ValidationError> {
    validate_content(content)?;
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::CommentTooLong);
    }
    Ok(())
}
