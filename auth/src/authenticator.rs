use std::sync::OnceLock;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenClaims;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

const DECOY_PASSWORD: &str = "decoy-password-never-assigned";

/// Authentication coordinator combining password verification and token
/// minting.
///
/// Acts as the token engine: a pure function of the signing secret, the
/// configured lifetime and the `now` passed by the caller.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    token_lifetime: Duration,
    decoy_hash: OnceLock<String>,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// JWT access token
    pub access_token: String,

    /// Claims embedded in the token
    pub claims: TokenClaims,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    /// * `token_lifetime` - Validity window of minted tokens
    ///
    /// # Returns
    /// Configured Authenticator instance with default hashing cost
    pub fn new(jwt_secret: &[u8], token_lifetime: Duration) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
            token_lifetime,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Replace the password hasher (e.g. one with tuned cost parameters).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - Stored hash is malformed
    pub fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Run a full password verification against a throwaway hash.
    ///
    /// Used when no principal matches a login, so that an unknown email costs
    /// the same Argon2 work as a wrong password. The decoy is hashed with the
    /// configured cost on first use and reused afterwards.
    ///
    /// # Errors
    /// * `HashingFailed` - The decoy hash could not be produced
    pub fn verify_decoy(&self, password: &str) -> Result<(), PasswordError> {
        let decoy = match self.decoy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.password_hasher.hash(DECOY_PASSWORD)?;
                self.decoy_hash.get_or_init(|| hash)
            }
        };
        self.password_hasher.verify(password, decoy)?;
        Ok(())
    }

    /// Verify credentials and mint a token for the principal.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Password verification failed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject_id: i64,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.verify_password(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.mint(subject_id, email, role, now)?)
    }

    /// Mint a signed token for a principal without checking a password.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn mint(
        &self,
        subject_id: i64,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticationResult, JwtError> {
        let claims = TokenClaims::new(subject_id, email, role, now, self.token_lifetime);
        let access_token = self.jwt_handler.encode(&claims)?;

        Ok(AuthenticationResult {
            access_token,
            claims,
        })
    }

    /// Whether a token carries a valid signature and is unexpired at `now`.
    ///
    /// Never fails: malformed, tampered and expired tokens are all `false`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.claims(token, now).is_ok()
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed token or bad signature
    /// * `TokenExpired` - Signature is fine but `now` is past expiry
    pub fn claims(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, JwtError> {
        let claims: TokenClaims = self.jwt_handler.decode(token)?;

        if claims.is_expired(now) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}
