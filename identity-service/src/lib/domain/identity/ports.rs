use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::errors::NotificationError;
use crate::domain::identity::models::Admin;
use crate::domain::identity::models::AccountSummary;
use crate::domain::identity::models::Branch;
use crate::domain::identity::models::ChangePasswordCommand;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::EnrollmentYear;
use crate::domain::identity::models::Faculty;
use crate::domain::identity::models::ForgotPasswordAcknowledgement;
use crate::domain::identity::models::ForgotPasswordCommand;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::LoginOutcome;
use crate::domain::identity::models::NewAdmin;
use crate::domain::identity::models::NewFaculty;
use crate::domain::identity::models::NewStudent;
use crate::domain::identity::models::PasswordResetNotice;
use crate::domain::identity::models::PasswordResetToken;
use crate::domain::identity::models::Principal;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::PrincipalKind;
use crate::domain::identity::models::RegisterAdminCommand;
use crate::domain::identity::models::RegisterFacultyCommand;
use crate::domain::identity::models::RegisterStudentCommand;
use crate::domain::identity::models::RegistrationReceipt;
use crate::domain::identity::models::ResetPasswordCommand;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::Student;

/// Port for authentication domain service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a student and allocate their roll number.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as a student
    /// * `DatabaseError` - Database operation failed
    async fn register_student(
        &self,
        command: RegisterStudentCommand,
    ) -> Result<RegistrationReceipt, AuthError>;

    /// Register a faculty member.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as faculty
    /// * `DatabaseError` - Database operation failed
    async fn register_faculty(
        &self,
        command: RegisterFacultyCommand,
    ) -> Result<RegistrationReceipt, AuthError>;

    /// Register an administrator with a free-form role.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as an admin
    /// * `DatabaseError` - Database operation failed
    async fn register_admin(
        &self,
        command: RegisterAdminCommand,
    ) -> Result<RegistrationReceipt, AuthError>;

    /// Verify credentials and mint an access token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError>;

    /// Start a password reset.
    ///
    /// Infallible by contract: the same acknowledgement is returned whether
    /// or not the email exists, and internal failures are only logged.
    async fn forgot_password(&self, command: ForgotPasswordCommand)
        -> ForgotPasswordAcknowledgement;

    /// Redeem a reset token and set a new password.
    ///
    /// # Errors
    /// * `InvalidToken` - Token unknown, already used or expired
    /// * `DatabaseError` - Database operation failed
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError>;

    /// Change the password of an authenticated principal.
    ///
    /// # Errors
    /// * `NotFound` - Principal no longer exists
    /// * `CurrentPasswordIncorrect` - Old password does not match
    async fn change_password(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError>;

    /// Load the caller's own account.
    ///
    /// # Errors
    /// * `NotFound` - Principal no longer exists
    async fn get_account(
        &self,
        principal_id: PrincipalId,
        role: &Role,
    ) -> Result<AccountSummary, AuthError>;

    /// Delete reset tokens that expired without ever being used.
    ///
    /// # Returns
    /// Number of deleted tokens
    async fn purge_stale_reset_tokens(&self) -> Result<u64, AuthError>;
}

/// Persistence operations over the three principal stores.
///
/// Every lookup names its store. Email uniqueness holds within a store, not
/// across stores.
#[async_trait]
pub trait PrincipalRepository: Send + Sync + 'static {
    /// Retrieve a principal by email from one store.
    ///
    /// # Returns
    /// Optional principal (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &EmailAddress,
    ) -> Result<Option<Principal>, AuthError>;

    /// Retrieve a principal by store-local id.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
    ) -> Result<Option<Principal>, AuthError>;

    /// Persist a new student.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as a student
    /// * `DatabaseError` - Database operation failed
    async fn create_student(&self, student: NewStudent) -> Result<Student, AuthError>;

    /// Persist a new faculty member.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as faculty
    /// * `DatabaseError` - Database operation failed
    async fn create_faculty(&self, faculty: NewFaculty) -> Result<Faculty, AuthError>;

    /// Persist a new administrator.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered as an admin
    /// * `DatabaseError` - Database operation failed
    async fn create_admin(&self, admin: NewAdmin) -> Result<Admin, AuthError>;

    /// Replace a principal's password hash.
    ///
    /// # Errors
    /// * `NotFound` - Principal does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_password(
        &self,
        kind: PrincipalKind,
        id: PrincipalId,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    /// Atomically allocate the next roll-number sequence for a branch and
    /// enrollment year. Concurrent callers never receive the same value.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn next_roll_sequence(
        &self,
        branch: &Branch,
        enrollment_year: EnrollmentYear,
    ) -> Result<u32, AuthError>;
}

/// Persistence operations for password reset tokens.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync + 'static {
    /// Persist a freshly issued token.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, token: PasswordResetToken) -> Result<(), AuthError>;

    /// Retrieve a token by its opaque value.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AuthError>;

    /// Consume a token and store the new password hash as one atomic unit.
    ///
    /// The token is marked used only if it is still unused and unexpired at
    /// `now`; the password of the principal identified by the token's email
    /// and user type is updated in the same transaction.
    ///
    /// # Errors
    /// * `InvalidToken` - Token was consumed concurrently or has expired
    /// * `NotFound` - The principal behind the token no longer exists
    /// * `DatabaseError` - Database operation failed
    async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Delete never-used tokens whose expiry is at or before `now`.
    ///
    /// # Returns
    /// Number of deleted tokens
    async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

/// Out-of-band delivery of password reset tokens.
#[async_trait]
pub trait ResetNotifier: Send + Sync + 'static {
    /// Ask for a reset notice to be delivered.
    ///
    /// # Errors
    /// * `DeliveryFailed` - The notice could not be handed off
    async fn deliver(&self, notice: &PasswordResetNotice) -> Result<(), NotificationError>;
}
