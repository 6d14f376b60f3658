use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by every access token.
///
/// The subject id is always present. Together with `role` it tells the
/// request authenticator which store the principal lives in, so a request can
/// be authorized without reading any store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Store-local principal identifier
    pub sub: i64,

    /// Principal email address
    pub email: String,

    /// `STUDENT`, `FACULTY` or the admin's own role string
    pub role: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a principal.
    ///
    /// # Arguments
    /// * `subject_id` - Store-local principal identifier
    /// * `email` - Principal email
    /// * `role` - Role string embedded verbatim
    /// * `issued_at` - Minting time
    /// * `lifetime` - How long the token stays valid
    ///
    /// # Returns
    /// Claims with `exp = issued_at + lifetime`
    pub fn new(
        subject_id: i64,
        email: impl Into<String>,
        role: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: subject_id,
            email: email.into(),
            role: role.into(),
            iat,
            exp: iat + lifetime.num_seconds(),
        }
    }

    /// Check if the token is expired at `now`.
    ///
    /// A token is usable strictly before its expiration second.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}
