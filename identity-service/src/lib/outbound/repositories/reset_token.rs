use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Row;

use super::principal::database_error;
use super::principal::update_password_sql;
use crate::domain::identity::errors::AuthError;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::PasswordResetToken;
use crate::domain::identity::models::PrincipalKind;
use crate::domain::identity::ports::ResetTokenRepository;

pub struct PostgresResetTokenRepository {
    pool: PgPool,
}

impl PostgresResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for PostgresResetTokenRepository {
    async fn create(&self, token: PasswordResetToken) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens
                (token, email, user_type, expiry_date, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&token.token)
        .bind(token.email.as_str())
        .bind(token.user_type.as_str())
        .bind(token.expiry_date)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT token, email, user_type, expiry_date, used, created_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(r) => {
                let user_type: String = r.try_get("user_type").map_err(database_error)?;
                Ok(Some(PasswordResetToken {
                    token: r.try_get("token").map_err(database_error)?,
                    email: EmailAddress::new(r.try_get("email").map_err(database_error)?)?,
                    user_type: user_type.parse()?,
                    expiry_date: r.try_get("expiry_date").map_err(database_error)?,
                    used: r.try_get("used").map_err(database_error)?,
                    created_at: r.try_get("created_at").map_err(database_error)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn redeem(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        // Guarded consume: of two concurrent redemptions only one sees a row.
        let consumed = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE token = $1 AND used = FALSE AND expiry_date > $2
            RETURNING email, user_type
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error)?;

        let Some(row) = consumed else {
            return Err(AuthError::InvalidToken);
        };

        let email: String = row.try_get("email").map_err(database_error)?;
        let user_type: String = row.try_get("user_type").map_err(database_error)?;
        let kind: PrincipalKind = user_type.parse()?;

        let updated = sqlx::query(&update_password_sql(kind, "email"))
            .bind(password_hash)
            .bind(&email)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        // Dropping the transaction rolls the token back to unused.
        if updated.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("{} {}", kind, email)));
        }

        tx.commit().await.map_err(database_error)?;

        Ok(())
    }

    async fn purge_stale(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE used = FALSE AND expiry_date <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
