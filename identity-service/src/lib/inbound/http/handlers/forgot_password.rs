use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageResponseData;
use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::ForgotPasswordAcknowledgement;
use crate::domain::identity::models::ForgotPasswordCommand;
use crate::domain::identity::models::Role;
use crate::inbound::http::router::AppState;

/// Start a password reset. The response never reveals whether the email is
/// registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiSuccess<MessageResponseData>, ApiError> {
    let command = body.try_into_command()?;
    state.auth_service.forgot_password(command).await;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageResponseData::new(ForgotPasswordAcknowledgement::MESSAGE),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
    /// Optional store hint; any role string other than STUDENT or FACULTY
    /// selects the admin store.
    #[serde(default)]
    role: Option<String>,
}

impl ForgotPasswordRequest {
    fn try_into_command(self) -> Result<ForgotPasswordCommand, AuthError> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(role) => Some(Role::from_claim(role)?.kind()),
        };

        Ok(ForgotPasswordCommand {
            email: EmailAddress::new(self.email)?,
            role,
        })
    }
}
