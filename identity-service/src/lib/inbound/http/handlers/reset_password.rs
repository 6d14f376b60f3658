use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageResponseData;
use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::NewPassword;
use crate::domain::identity::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageResponseData>, ApiError> {
    state
        .auth_service
        .reset_password(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageResponseData::new("Password has been reset successfully"),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
}

impl ResetPasswordRequest {
    fn try_into_command(self) -> Result<ResetPasswordCommand, AuthError> {
        let token = self.token.trim().to_string();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(ResetPasswordCommand {
            token,
            new_password: NewPassword::new(self.new_password)?,
        })
    }
}
