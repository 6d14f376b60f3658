use std::collections::HashSet;
use std::sync::Arc;

use auth::JwtError;
use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::identity::models::PrincipalId;
use crate::domain::identity::models::Role;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated principal in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub id: PrincipalId,
    pub email: String,
    pub role: Role,
}

/// Middleware that validates bearer tokens and adds the principal to request
/// extensions.
///
/// Validation is stateless: signature and expiry only, no store lookup.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = state
        .authenticator
        .claims(token, state.clock.now())
        .map_err(|e| {
            tracing::warn!(error = %e, "Token validation failed");
            let message = match e {
                JwtError::TokenExpired => "Token has expired",
                _ => "Invalid or expired token",
            };
            unauthorized(message)
        })?;

    let role = Role::from_claim(&claims.role).map_err(|e| {
        tracing::error!(error = %e, "Unusable role claim in token");
        unauthorized("Invalid token format")
    })?;

    req.extensions_mut().insert(AuthenticatedPrincipal {
        id: PrincipalId(claims.sub),
        email: claims.email,
        role,
    });

    Ok(next.run(req).await)
}

/// Set of role strings permitted on an endpoint group.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: Arc<HashSet<String>>,
}

impl RoleGate {
    pub fn new(allowed: HashSet<String>) -> Self {
        Self {
            allowed: Arc::new(allowed),
        }
    }

    /// A gate permitting everything this one does plus `role`.
    pub fn with_role(&self, role: &str) -> Self {
        let mut allowed = (*self.allowed).clone();
        allowed.insert(role.to_string());
        Self::new(allowed)
    }

    pub fn permits(&self, role: &Role) -> bool {
        self.allowed.contains(role.as_str())
    }
}

/// Middleware that rejects principals whose role is not in the gate's set.
///
/// Must run inside [`authenticate`].
pub async fn require_role(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(principal) = req.extensions().get::<AuthenticatedPrincipal>() else {
        return Err(unauthorized("Authentication required"));
    };

    if !gate.permits(&principal.role) {
        tracing::info!(
            principal_id = %principal.id,
            role = %principal.role,
            uri = %req.uri(),
            "Access denied for role"
        );
        return Err(ApiError::Forbidden("Access denied".to_string()).into_response());
    }

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    // The scheme name is case-insensitive
    auth_str
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            unauthorized("Invalid Authorization header format. Expected: Bearer <token>")
        })
}
