use std::sync::Arc;

use auth::Authenticator;
use auth::Clock;
use auth::PasswordHasher;
use auth::SystemClock;
use chrono::Duration;
use identity_service::config::Config;
use identity_service::domain::identity::ports::AuthServicePort;
use identity_service::domain::identity::service::AuthService;
use identity_service::domain::identity::service::PasswordResetSettings;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::notifications::TracingResetNotifier;
use identity_service::outbound::repositories::PostgresPrincipalRepository;
use identity_service::outbound::repositories::PostgresResetTokenRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_expiration_hours = config.jwt.expiration_hours,
        reset_token_lifetime_minutes = config.password_reset.token_lifetime_minutes,
        admin_roles = ?config.authorization.admin_roles,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password_hasher = PasswordHasher::with_cost(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let authenticator = Arc::new(
        Authenticator::new(
            config.jwt.secret.as_bytes(),
            Duration::hours(config.jwt.expiration_hours),
        )
        .with_password_hasher(password_hasher),
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let principal_repository = Arc::new(PostgresPrincipalRepository::new(pg_pool.clone()));
    let reset_token_repository = Arc::new(PostgresResetTokenRepository::new(pg_pool));
    let notifier = Arc::new(TracingResetNotifier::new());

    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        principal_repository,
        reset_token_repository,
        notifier,
        Arc::clone(&authenticator),
        Arc::clone(&clock),
        PasswordResetSettings {
            token_lifetime: Duration::minutes(config.password_reset.token_lifetime_minutes),
            link_base_url: config.password_reset.link_base_url.clone(),
        },
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        authenticator,
        clock,
        config.authorization.admin_role_set(),
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
