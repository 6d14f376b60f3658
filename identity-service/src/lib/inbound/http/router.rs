use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::Clock;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::current_principal::current_principal;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_account::get_account;
use super::handlers::login::login;
use super::handlers::login::login_admin;
use super::handlers::login::login_faculty;
use super::handlers::login::login_student;
use super::handlers::purge_reset_tokens::purge_reset_tokens;
use super::handlers::register::register_admin;
use super::handlers::register::register_faculty;
use super::handlers::register::register_student;
use super::handlers::reset_password::reset_password;
use super::middleware::authenticate;
use super::middleware::require_role;
use super::middleware::RoleGate;
use crate::domain::identity::models::Role;
use crate::domain::identity::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub clock: Arc<dyn Clock>,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    authenticator: Arc<Authenticator>,
    clock: Arc<dyn Clock>,
    admin_roles: HashSet<String>,
) -> Router {
    let state = AppState {
        auth_service,
        authenticator,
        clock,
    };

    let admin_gate = RoleGate::new(admin_roles);
    let student_gate = admin_gate.with_role(Role::STUDENT);
    let faculty_gate = admin_gate.with_role(Role::FACULTY);

    let public_routes = Router::new()
        .route("/api/auth/student/register", post(register_student))
        .route("/api/auth/student/login", post(login_student))
        .route("/api/auth/faculty/register", post(register_faculty))
        .route("/api/auth/faculty/login", post(login_faculty))
        .route("/api/auth/admin/register", post(register_admin))
        .route("/api/auth/admin/login", post(login_admin))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password));

    // The last route_layer wraps outermost, so the token is checked before
    // any role gate looks at the principal.
    let authenticated_routes = Router::new()
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/me", get(current_principal))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let student_routes = Router::new()
        .route("/api/student/account", get(get_account))
        .route_layer(middleware::from_fn_with_state(student_gate, require_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let faculty_routes = Router::new()
        .route("/api/faculty/account", get(get_account))
        .route_layer(middleware::from_fn_with_state(faculty_gate, require_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let admin_routes = Router::new()
        .route("/api/admin/account", get(get_account))
        .route(
            "/api/admin/password-reset-tokens/stale",
            delete(purge_reset_tokens),
        )
        .route_layer(middleware::from_fn_with_state(admin_gate, require_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            // Headers are left out: they carry bearer tokens.
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(student_routes)
        .merge(faculty_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
