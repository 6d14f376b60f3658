use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::LoginCommand;
use crate::domain::identity::models::LoginOutcome;
use crate::domain::identity::models::PrincipalKind;
use crate::inbound::http::router::AppState;

pub async fn login_student(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    login_as(&state, body, Some(PrincipalKind::Student)).await
}

pub async fn login_faculty(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    login_as(&state, body, Some(PrincipalKind::Faculty)).await
}

pub async fn login_admin(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    login_as(&state, body, Some(PrincipalKind::Admin)).await
}

/// Role-less login: the first store holding the email wins.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    login_as(&state, body, None).await
}

async fn login_as(
    state: &AppState,
    body: LoginRequestBody,
    role: Option<PrincipalKind>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    // A malformed email cannot match any account; answer like any other miss.
    let email = EmailAddress::new(body.email)
        .map_err(|_| ApiError::from(AuthError::InvalidCredentials))?;

    state
        .auth_service
        .login(LoginCommand {
            email,
            password: body.password,
            role,
        })
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::OK, outcome.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub token: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&LoginOutcome> for LoginResponseData {
    fn from(outcome: &LoginOutcome) -> Self {
        Self {
            token: outcome.token.clone(),
            token_type: "Bearer".to_string(),
            user_id: outcome.principal_id.0,
            email: outcome.email.as_str().to_string(),
            role: outcome.role.as_str().to_string(),
            expires_at: outcome.expires_at,
        }
    }
}
