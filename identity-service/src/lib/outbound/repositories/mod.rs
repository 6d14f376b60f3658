pub mod principal;
pub mod reset_token;

pub use principal::PostgresPrincipalRepository;
pub use reset_token::PostgresResetTokenRepository;
