use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::Clock;
use chrono::Duration;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::AccountSummary;
use crate::domain::identity::models::ChangePasswordCommand;
use crate::domain::identity::models::EmailAddress;
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
use crate::domain::identity::models::RollNumber;
use crate::domain::identity::ports::AuthServicePort;
use crate::domain::identity::ports::PrincipalRepository;
use crate::domain::identity::ports::ResetNotifier;
use crate::domain::identity::ports::ResetTokenRepository;
use crate::domain::identity::resolver::IdentityResolver;

/// Settings for the forgot/reset password flow.
#[derive(Debug, Clone)]
pub struct PasswordResetSettings {
    /// How long an issued reset token stays redeemable
    pub token_lifetime: Duration,

    /// Link sent to the user; the token is appended as `?token=`
    pub link_base_url: String,
}

impl Default for PasswordResetSettings {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::minutes(30),
            link_base_url: "http://localhost:8080/reset-password".to_string(),
        }
    }
}

/// Domain service implementation for authentication operations.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<PR, TR, RN>
where
    PR: PrincipalRepository,
    TR: ResetTokenRepository,
    RN: ResetNotifier,
{
    principals: Arc<PR>,
    resolver: IdentityResolver<PR>,
    reset_tokens: Arc<TR>,
    notifier: Arc<RN>,
    authenticator: Arc<Authenticator>,
    clock: Arc<dyn Clock>,
    reset_settings: PasswordResetSettings,
}

impl<PR, TR, RN> AuthService<PR, TR, RN>
where
    PR: PrincipalRepository,
    TR: ResetTokenRepository,
    RN: ResetNotifier,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `principals` - Principal store implementation
    /// * `reset_tokens` - Reset token store implementation
    /// * `notifier` - Reset notice delivery
    /// * `authenticator` - Password hashing and token minting
    /// * `clock` - Time source for token issuance and expiry checks
    /// * `reset_settings` - Reset token lifetime and link
    pub fn new(
        principals: Arc<PR>,
        reset_tokens: Arc<TR>,
        notifier: Arc<RN>,
        authenticator: Arc<Authenticator>,
        clock: Arc<dyn Clock>,
        reset_settings: PasswordResetSettings,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(Arc::clone(&principals)),
            principals,
            reset_tokens,
            notifier,
            authenticator,
            clock,
            reset_settings,
        }
    }

    /// Hash on the blocking pool; Argon2 is deliberately slow.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password verification task failed: {}", e)))?
            .map_err(AuthError::from)
    }

    async fn ensure_email_free(
        &self,
        kind: PrincipalKind,
        email: &EmailAddress,
    ) -> Result<(), AuthError> {
        if self
            .principals
            .find_by_email(kind, email)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail {
                kind,
                email: email.to_string(),
            });
        }
        Ok(())
    }

    async fn load_principal(
        &self,
        principal_id: PrincipalId,
        kind: PrincipalKind,
    ) -> Result<Principal, AuthError> {
        self.resolver
            .resolve_by_id(principal_id, kind)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("{} {}", kind, principal_id)))
    }

    async fn issue_reset_token(&self, principal: &Principal) -> Result<(), AuthError> {
        let token = PasswordResetToken::issue(
            principal.email().clone(),
            principal.kind(),
            self.clock.now(),
            self.reset_settings.token_lifetime,
        );

        self.reset_tokens.create(token.clone()).await?;

        let notice = PasswordResetNotice {
            reset_link: format!("{}?token={}", self.reset_settings.link_base_url, token.token),
            email: token.email,
            token: token.token,
            expires_at: token.expiry_date,
        };

        // The token is stored either way; a failed hand-off only means the
        // user has to ask again.
        if let Err(e) = self.notifier.deliver(&notice).await {
            tracing::error!(
                user_type = %principal.kind(),
                principal_id = %principal.id(),
                error = %e,
                "Failed to deliver password reset notice"
            );
        }

        Ok(())
    }
}

#[async_trait]
impl<PR, TR, RN> AuthServicePort for AuthService<PR, TR, RN>
where
    PR: PrincipalRepository,
    TR: ResetTokenRepository,
    RN: ResetNotifier,
{
    async fn register_student(
        &self,
        command: RegisterStudentCommand,
    ) -> Result<RegistrationReceipt, AuthError> {
        self.ensure_email_free(PrincipalKind::Student, &command.email)
            .await?;

        let password_hash = self.hash_password(command.password.as_str()).await?;

        let sequence = self
            .principals
            .next_roll_sequence(&command.branch, command.enrollment_year)
            .await?;
        let roll_number = RollNumber::new(&command.branch, command.enrollment_year, sequence);

        let student = self
            .principals
            .create_student(NewStudent {
                name: command.name.into_inner(),
                email: command.email,
                phone: command.phone.into_inner(),
                password_hash,
                branch: command.branch,
                enrollment_year: command.enrollment_year,
                roll_number,
                semester: 1,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            student_id = %student.id,
            roll_number = %student.roll_number,
            "Student registered"
        );

        Ok(RegistrationReceipt {
            id: student.id,
            name: student.name,
            email: student.email,
            role: Role::Student,
            roll_number: Some(student.roll_number),
        })
    }

    async fn register_faculty(
        &self,
        command: RegisterFacultyCommand,
    ) -> Result<RegistrationReceipt, AuthError> {
        self.ensure_email_free(PrincipalKind::Faculty, &command.email)
            .await?;

        let password_hash = self.hash_password(command.password.as_str()).await?;

        let faculty = self
            .principals
            .create_faculty(NewFaculty {
                name: command.name.into_inner(),
                email: command.email,
                phone: command.phone.into_inner(),
                password_hash,
                department: command.department.into_inner(),
                designation: command.designation.into_inner(),
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(faculty_id = %faculty.id, "Faculty registered");

        Ok(RegistrationReceipt {
            id: faculty.id,
            name: faculty.name,
            email: faculty.email,
            role: Role::Faculty,
            roll_number: None,
        })
    }

    async fn register_admin(
        &self,
        command: RegisterAdminCommand,
    ) -> Result<RegistrationReceipt, AuthError> {
        self.ensure_email_free(PrincipalKind::Admin, &command.email)
            .await?;

        let password_hash = self.hash_password(command.password.as_str()).await?;

        let admin = self
            .principals
            .create_admin(NewAdmin {
                name: command.name.into_inner(),
                email: command.email,
                phone: command.phone.into_inner(),
                password_hash,
                role: command.role,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(admin_id = %admin.id, role = %admin.role.as_str(), "Admin registered");

        Ok(RegistrationReceipt {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            role: Role::Admin(admin.role),
            roll_number: None,
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError> {
        let principal = self
            .resolver
            .resolve_hinted(&command.email, command.role)
            .await?;

        let Some(principal) = principal else {
            let authenticator = Arc::clone(&self.authenticator);
            let password = command.password;
            let decoy = tokio::task::spawn_blocking(move || authenticator.verify_decoy(&password))
                .await
                .map_err(|e| AuthError::Unknown(format!("Login task failed: {}", e)))?;
            if let Err(e) = decoy {
                tracing::error!(error = %e, "Decoy password verification failed");
            }

            tracing::info!(role_hint = ?command.role, "Login rejected: no matching principal");
            return Err(AuthError::InvalidCredentials);
        };

        let role = principal.role();
        let now = self.clock.now();
        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let stored_hash = principal.password_hash().to_string();
        let subject_id = principal.id().0;
        let email = principal.email().as_str().to_string();
        let role_claim = role.as_str().to_string();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(
                &password,
                &stored_hash,
                subject_id,
                &email,
                &role_claim,
                now,
            )
        })
        .await
        .map_err(|e| AuthError::Unknown(format!("Login task failed: {}", e)))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::info!(
                    principal_id = %principal.id(),
                    user_type = %principal.kind(),
                    "Login rejected: wrong password"
                );
                AuthError::InvalidCredentials
            }
            AuthenticationError::PasswordError(err) => AuthError::Password(err),
            AuthenticationError::JwtError(err) => AuthError::Token(err),
        })?;

        tracing::info!(
            principal_id = %principal.id(),
            role = %role,
            "Login succeeded"
        );

        Ok(LoginOutcome {
            token: result.access_token,
            principal_id: principal.id(),
            email: principal.email().clone(),
            role,
            expires_at: result.claims.expires_at(),
        })
    }

    async fn forgot_password(
        &self,
        command: ForgotPasswordCommand,
    ) -> ForgotPasswordAcknowledgement {
        match self
            .resolver
            .resolve_hinted(&command.email, command.role)
            .await
        {
            Ok(Some(principal)) => {
                if let Err(e) = self.issue_reset_token(&principal).await {
                    tracing::error!(error = %e, "Failed to issue password reset token");
                } else {
                    tracing::info!(
                        principal_id = %principal.id(),
                        user_type = %principal.kind(),
                        "Password reset token issued"
                    );
                }
            }
            Ok(None) => {
                tracing::debug!(role_hint = ?command.role, "Password reset for unknown email");
            }
            Err(e) => {
                tracing::error!(error = %e, "Password reset lookup failed");
            }
        }

        ForgotPasswordAcknowledgement
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError> {
        let now = self.clock.now();

        let token = self
            .reset_tokens
            .find_by_token(&command.token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !token.is_consumable(now) {
            tracing::info!(
                used = token.used,
                expired = now >= token.expiry_date,
                "Password reset rejected"
            );
            return Err(AuthError::InvalidToken);
        }

        let password_hash = self.hash_password(command.new_password.as_str()).await?;

        self.reset_tokens
            .redeem(&token.token, &password_hash, now)
            .await?;

        tracing::info!(user_type = %token.user_type, "Password reset completed");

        Ok(())
    }

    async fn change_password(
        &self,
        principal_id: PrincipalId,
        role: &Role,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError> {
        let kind = role.kind();
        let principal = self.load_principal(principal_id, kind).await?;

        if !self
            .verify_password(&command.old_password, principal.password_hash())
            .await?
        {
            return Err(AuthError::CurrentPasswordIncorrect);
        }

        let password_hash = self.hash_password(command.new_password.as_str()).await?;

        self.principals
            .update_password(kind, principal_id, &password_hash)
            .await?;

        tracing::info!(principal_id = %principal_id, user_type = %kind, "Password changed");

        Ok(())
    }

    async fn get_account(
        &self,
        principal_id: PrincipalId,
        role: &Role,
    ) -> Result<AccountSummary, AuthError> {
        let principal = self.load_principal(principal_id, role.kind()).await?;
        Ok(AccountSummary::from(&principal))
    }

    async fn purge_stale_reset_tokens(&self) -> Result<u64, AuthError> {
        let purged = self.reset_tokens.purge_stale(self.clock.now()).await?;
        tracing::info!(purged, "Stale password reset tokens purged");
        Ok(purged)
    }
}
