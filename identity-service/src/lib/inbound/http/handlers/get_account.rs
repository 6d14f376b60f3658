use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::AccountSummary;
use crate::inbound::http::middleware::AuthenticatedPrincipal;
use crate::inbound::http::router::AppState;

/// Load the caller's own account from the store implied by their role.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Result<ApiSuccess<AccountResponseData>, ApiError> {
    state
        .auth_service
        .get_account(principal.id, &principal.role)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountResponseData {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&AccountSummary> for AccountResponseData {
    fn from(account: &AccountSummary) -> Self {
        Self {
            id: account.id.0,
            name: account.name.clone(),
            email: account.email.as_str().to_string(),
            role: account.role.as_str().to_string(),
            roll_number: account.roll_number.as_ref().map(|r| r.as_str().to_string()),
            created_at: account.created_at,
        }
    }
}
