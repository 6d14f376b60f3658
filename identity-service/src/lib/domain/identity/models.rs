use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::identity::errors::AdminRoleError;
use crate::domain::identity::errors::EmailError;
use crate::domain::identity::errors::FieldError;
use crate::domain::identity::errors::PasswordPolicyError;
use crate::domain::identity::errors::PrincipalKindError;

/// Store-local principal identifier.
///
/// Only unique within one store: student 1 and faculty 1 are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PrincipalId(pub i64);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which identity store a principal lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    Student,
    Faculty,
    Admin,
}

impl PrincipalKind {
    /// Probe order for role-less resolution.
    pub const SEARCH_ORDER: [PrincipalKind; 3] = [
        PrincipalKind::Student,
        PrincipalKind::Faculty,
        PrincipalKind::Admin,
    ];

    /// Tag persisted alongside password reset tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Student => "STUDENT",
            PrincipalKind::Faculty => "FACULTY",
            PrincipalKind::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = PrincipalKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(PrincipalKind::Student),
            "FACULTY" => Ok(PrincipalKind::Faculty),
            "ADMIN" => Ok(PrincipalKind::Admin),
            other => Err(PrincipalKindError(other.to_string())),
        }
    }
}

/// Role string chosen for an administrator at registration.
///
/// Admin roles are an open set (`SuperAdmin`, `Admin`, `Accountant`, ...).
/// The built-in student and faculty role names are refused so that a role read
/// back from a token always points at exactly one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdminRole(String);

impl AdminRole {
    pub const MAX_LENGTH: usize = 64;

    pub fn new(role: String) -> Result<Self, AdminRoleError> {
        let role = role.trim().to_string();
        if role.is_empty() {
            return Err(AdminRoleError::Blank);
        }
        if role.chars().count() > Self::MAX_LENGTH {
            return Err(AdminRoleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let upper = role.to_ascii_uppercase();
        if upper == Role::STUDENT || upper == Role::FACULTY {
            return Err(AdminRoleError::Reserved(role));
        }

        Ok(Self(role))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Role carried in tokens and checked by endpoint policies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Faculty,
    Admin(AdminRole),
}

impl Role {
    pub const STUDENT: &'static str = "STUDENT";
    pub const FACULTY: &'static str = "FACULTY";

    /// Interpret a role string taken from a token.
    ///
    /// Anything other than the student and faculty names belongs to the admin
    /// family, whatever the specific string.
    pub fn from_claim(role: &str) -> Result<Self, AdminRoleError> {
        match role.trim().to_ascii_uppercase().as_str() {
            Self::STUDENT => Ok(Role::Student),
            Self::FACULTY => Ok(Role::Faculty),
            _ => {
                let role = role.trim();
                if role.is_empty() {
                    Err(AdminRoleError::Blank)
                } else {
                    Ok(Role::Admin(AdminRole(role.to_string())))
                }
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => Self::STUDENT,
            Role::Faculty => Self::FACULTY,
            Role::Admin(role) => role.as_str(),
        }
    }

    /// The store this role's principals live in.
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Role::Student => PrincipalKind::Student,
            Role::Faculty => PrincipalKind::Faculty,
            Role::Admin(_) => PrincipalKind::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub const MAX_LENGTH: usize = 255;

    /// Create a new validated email address.
    ///
    /// Surrounding whitespace is dropped; case is preserved.
    ///
    /// # Errors
    /// * `TooLong` - Email exceeds `MAX_LENGTH` characters
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_string();
        if email.chars().count() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A password about to be stored, checked against the password policy.
///
/// At least 8 characters, one uppercase letter, one digit and one of
/// `@$!%*?&`, drawn only from letters, digits and those specials.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(String);

impl NewPassword {
    const MIN_LENGTH: usize = 8;
    const SPECIALS: &'static str = "@$!%*?&";

    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }

        if !password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || Self::SPECIALS.contains(c))
        {
            return Err(PasswordPolicyError::InvalidCharacters);
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PasswordPolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingDigit);
        }
        if !password.chars().any(|c| Self::SPECIALS.contains(c)) {
            return Err(PasswordPolicyError::MissingSpecial);
        }

        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(***)")
    }
}

/// Required free-text field (name, phone, department, ...), bounded by the
/// width of the column it is stored in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredText(String);

impl RequiredText {
    pub const TEXT_MAX_LENGTH: usize = 255;
    pub const PHONE_MAX_LENGTH: usize = 32;

    pub fn new(field: &'static str, value: String, max: usize) -> Result<Self, FieldError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(FieldError::Blank(field));
        }
        if value.chars().count() > max {
            return Err(FieldError::TooLong { field, max });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Academic branch code, stored upper-cased (`CSE`, `ECE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Branch(String);

impl Branch {
    pub const MAX_LENGTH: usize = 32;

    pub fn new(branch: String) -> Result<Self, FieldError> {
        let branch = branch.trim().to_ascii_uppercase();
        if branch.is_empty() {
            return Err(FieldError::Blank("branch"));
        }
        if branch.chars().count() > Self::MAX_LENGTH {
            return Err(FieldError::TooLong {
                field: "branch",
                max: Self::MAX_LENGTH,
            });
        }
        if !branch.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FieldError::InvalidBranch);
        }
        Ok(Self(branch))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnrollmentYear(i32);

impl EnrollmentYear {
    const MIN: i32 = 1900;
    const MAX: i32 = 2999;

    pub fn new(year: i32) -> Result<Self, FieldError> {
        if (Self::MIN..=Self::MAX).contains(&year) {
            Ok(Self(year))
        } else {
            Err(FieldError::InvalidEnrollmentYear(year))
        }
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// Student roll number: branch, enrollment year and a zero-padded sequence,
/// e.g. `CSE2024001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RollNumber(String);

impl RollNumber {
    pub fn new(branch: &Branch, year: EnrollmentYear, sequence: u32) -> Self {
        Self(format!("{}{}{:03}", branch.as_str(), year.value(), sequence))
    }

    /// Wrap a roll number read back from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub struct Student {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub branch: Branch,
    pub enrollment_year: EnrollmentYear,
    pub roll_number: RollNumber,
    pub semester: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Faculty {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub department: String,
    pub designation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Admin {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

/// A principal from any of the three stores.
#[derive(Debug, Clone)]
pub enum Principal {
    Student(Student),
    Faculty(Faculty),
    Admin(Admin),
}

impl Principal {
    pub fn id(&self) -> PrincipalId {
        match self {
            Principal::Student(s) => s.id,
            Principal::Faculty(f) => f.id,
            Principal::Admin(a) => a.id,
        }
    }

    pub fn email(&self) -> &EmailAddress {
        match self {
            Principal::Student(s) => &s.email,
            Principal::Faculty(f) => &f.email,
            Principal::Admin(a) => &a.email,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Student(s) => &s.name,
            Principal::Faculty(f) => &f.name,
            Principal::Admin(a) => &a.name,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Principal::Student(s) => &s.password_hash,
            Principal::Faculty(f) => &f.password_hash,
            Principal::Admin(a) => &a.password_hash,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Student(_) => Role::Student,
            Principal::Faculty(_) => Role::Faculty,
            Principal::Admin(a) => Role::Admin(a.role.clone()),
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Student(_) => PrincipalKind::Student,
            Principal::Faculty(_) => PrincipalKind::Faculty,
            Principal::Admin(_) => PrincipalKind::Admin,
        }
    }
}

/// Student row to insert; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub branch: Branch,
    pub enrollment_year: EnrollmentYear,
    pub roll_number: RollNumber,
    pub semester: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFaculty {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub department: String,
    pub designation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

/// Single-use, time-boxed token authorizing one password reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub token: String,
    pub email: EmailAddress,
    pub user_type: PrincipalKind,
    pub expiry_date: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Issue a fresh token with a random opaque value.
    pub fn issue(
        email: EmailAddress,
        user_type: PrincipalKind,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            email,
            user_type,
            expiry_date: now + lifetime,
            used: false,
            created_at: now,
        }
    }

    /// Whether the token may still be redeemed at `now`.
    pub fn is_consumable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expiry_date
    }
}

/// What the notifier is asked to deliver after a reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetNotice {
    pub email: EmailAddress,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub reset_link: String,
}

/// Command to register a student with validated fields
#[derive(Debug)]
pub struct RegisterStudentCommand {
    pub name: RequiredText,
    pub email: EmailAddress,
    pub phone: RequiredText,
    pub password: NewPassword,
    pub branch: Branch,
    pub enrollment_year: EnrollmentYear,
}

#[derive(Debug)]
pub struct RegisterFacultyCommand {
    pub name: RequiredText,
    pub email: EmailAddress,
    pub phone: RequiredText,
    pub password: NewPassword,
    pub department: RequiredText,
    pub designation: RequiredText,
}

#[derive(Debug)]
pub struct RegisterAdminCommand {
    pub name: RequiredText,
    pub email: EmailAddress,
    pub phone: RequiredText,
    pub password: NewPassword,
    pub role: AdminRole,
}

/// Command to log in.
///
/// `role` is the store hint: `None` falls back to role-less resolution, which
/// prefers student, then faculty, then admin.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: EmailAddress,
    pub password: String,
    pub role: Option<PrincipalKind>,
}

#[derive(Debug)]
pub struct ForgotPasswordCommand {
    pub email: EmailAddress,
    pub role: Option<PrincipalKind>,
}

#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub token: String,
    pub new_password: NewPassword,
}

#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub old_password: String,
    pub new_password: NewPassword,
}

/// Registration confirmation. Registration does not log the principal in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub role: Role,
    pub roll_number: Option<RollNumber>,
}

impl RegistrationReceipt {
    pub const MESSAGE: &'static str = "Registration successful. Please login.";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: String,
    pub principal_id: PrincipalId,
    pub email: EmailAddress,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Answer to every forgot-password request, whether or not the email exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgotPasswordAcknowledgement;

impl ForgotPasswordAcknowledgement {
    pub const MESSAGE: &'static str = "If the email exists, a reset link has been sent";
}

/// Outward view of a principal's own account; never includes the hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: PrincipalId,
    pub name: String,
    pub email: EmailAddress,
    pub role: Role,
    pub roll_number: Option<RollNumber>,
    pub created_at: DateTime<Utc>,
}

impl From<&Principal> for AccountSummary {
    fn from(principal: &Principal) -> Self {
        let roll_number = match principal {
            Principal::Student(s) => Some(s.roll_number.clone()),
            _ => None,
        };
        let created_at = match principal {
            Principal::Student(s) => s.created_at,
            Principal::Faculty(f) => f.created_at,
            Principal::Admin(a) => a.created_at,
        };

        Self {
            id: principal.id(),
            name: principal.name().to_string(),
            email: principal.email().clone(),
            role: principal.role(),
            roll_number,
            created_at,
        }
    }
}
