use thiserror::Error;

use crate::domain::identity::models::PrincipalKind;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),

    #[error("Email too long: maximum {max} characters")]
    TooLong { max: usize },
}

/// Error for passwords that do not meet the password policy
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one number")]
    MissingDigit,

    #[error("Password must contain at least one special character (@$!%*?&)")]
    MissingSpecial,

    #[error("Password may only contain letters, digits and @$!%*?&")]
    InvalidCharacters,
}

/// Error for free-form registration fields
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("{field} too long: maximum {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Branch may only contain letters and digits")]
    InvalidBranch,

    #[error("Enrollment year out of range: {0}")]
    InvalidEnrollmentYear(i32),
}

/// Error for admin role strings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminRoleError {
    #[error("Admin role must not be blank")]
    Blank,

    #[error("Admin role too long: maximum {max} characters")]
    TooLong { max: usize },

    #[error("Admin role may not reuse a built-in role name: {0}")]
    Reserved(String),
}

/// Error for principal kind tags read back from storage
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown principal kind: {0}")]
pub struct PrincipalKindError(pub String);

/// Error delivering a password reset notice
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all authentication operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    #[error("Invalid field: {0}")]
    InvalidField(#[from] FieldError),

    #[error("Invalid admin role: {0}")]
    InvalidAdminRole(#[from] AdminRoleError),

    #[error("Invalid principal kind: {0}")]
    InvalidPrincipalKind(#[from] PrincipalKindError),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] auth::JwtError),

    // Domain-level errors
    #[error("Email already registered as {kind}: {email}")]
    DuplicateEmail { kind: PrincipalKind, email: String },

    /// Login failure. Deliberately identical for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Change-password failure. The caller is already authenticated.
    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    /// Reset-password failure. Unknown, used and expired tokens look the same.
    #[error("Invalid or expired reset token")]
    InvalidToken,

    #[error("Principal not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
