//! Authentication utilities library
//!
//! Provides the credential primitives used by the identity service:
//! - Password hashing (Argon2id)
//! - Access token minting and validation (HS256 JWT)
//! - Injectable clocks
//!
//! Nothing in this crate reads the wall clock when deciding whether a token is
//! valid: callers pass `now` in, usually from a [`Clock`].
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("My@password1").unwrap();
//! let is_valid = hasher.verify("My@password1", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, Clock, SystemClock};
//! use chrono::Duration;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(24));
//! let clock = SystemClock;
//!
//! // Register: hash password
//! let hash = auth.hash_password("My@password1").unwrap();
//!
//! // Login: verify and mint token
//! let result = auth
//!     .authenticate("My@password1", &hash, 7, "rahul@college.edu", "STUDENT", clock.now())
//!     .unwrap();
//!
//! // Every later request: validate statelessly
//! assert!(auth.validate(&result.access_token, clock.now()));
//! let claims = auth.claims(&result.access_token, clock.now()).unwrap();
//! assert_eq!(claims.role, "STUDENT");
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use password::PasswordError;
pub use password::PasswordHasher;
