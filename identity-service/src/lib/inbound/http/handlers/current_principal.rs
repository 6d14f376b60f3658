use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedPrincipal;

/// Echo the principal carried by the bearer token. No store lookup.
pub async fn current_principal(
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Result<ApiSuccess<CurrentPrincipalResponseData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, (&principal).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentPrincipalResponseData {
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

impl From<&AuthenticatedPrincipal> for CurrentPrincipalResponseData {
    fn from(principal: &AuthenticatedPrincipal) -> Self {
        Self {
            user_id: principal.id.0,
            email: principal.email.clone(),
            role: principal.role.as_str().to_string(),
        }
    }
}
