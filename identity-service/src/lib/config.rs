use std::collections::HashSet;
use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Shortest accepted HS256 signing secret, in bytes.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub password_reset: PasswordResetConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Argon2id cost parameters.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PasswordResetConfig {
    pub token_lifetime_minutes: i64,
    pub link_base_url: String,
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_lifetime_minutes: 30,
            link_base_url: "http://localhost:3000/reset-password".to_string(),
        }
    }
}

/// Role strings that count as the admin family for endpoint policies.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthorizationConfig {
    pub admin_roles: Vec<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            admin_roles: vec![
                "SuperAdmin".to_string(),
                "Admin".to_string(),
                "Accountant".to_string(),
            ],
        }
    }
}

impl AuthorizationConfig {
    pub fn admin_role_set(&self) -> HashSet<String> {
        self.admin_roles.iter().map(|r| r.trim().to_string()).collect()
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: PASSWORD_RESET__TOKEN_LIFETIME_MINUTES=15
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings that would make the service insecure or unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }
        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_hours must be positive".to_string(),
            ));
        }
        if self.password_reset.token_lifetime_minutes <= 0 {
            return Err(ConfigError::Message(
                "password_reset.token_lifetime_minutes must be positive".to_string(),
            ));
        }
        if self.authorization.admin_roles.iter().all(|r| r.trim().is_empty()) {
            return Err(ConfigError::Message(
                "authorization.admin_roles must name at least one role".to_string(),
            ));
        }
        Ok(())
    }
}
