use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedPrincipal;
use crate::inbound::http::router::AppState;

/// Delete reset tokens that expired without being used.
pub async fn purge_reset_tokens(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Result<ApiSuccess<PurgeResetTokensResponseData>, ApiError> {
    let purged = state
        .auth_service
        .purge_stale_reset_tokens()
        .await
        .map_err(ApiError::from)?;

    tracing::info!(
        admin_id = %principal.id,
        role = %principal.role,
        purged,
        "Stale reset tokens purged on request"
    );

    Ok(ApiSuccess::new(
        StatusCode::OK,
        PurgeResetTokensResponseData { purged },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeResetTokensResponseData {
    pub purged: u64,
}
