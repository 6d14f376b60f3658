use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::identity::errors::NotificationError;
use crate::domain::identity::models::PasswordResetNotice;
use crate::domain::identity::ports::ResetNotifier;

/// Payload handed to the mail relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetNoticeMessage {
    pub to: String,
    pub subject: String,
    pub reset_link: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&PasswordResetNotice> for ResetNoticeMessage {
    fn from(notice: &PasswordResetNotice) -> Self {
        Self {
            to: notice.email.as_str().to_string(),
            subject: "Password reset request".to_string(),
            reset_link: notice.reset_link.clone(),
            expires_at: notice.expires_at,
        }
    }
}

/// Notifier that writes reset notices to the log instead of sending mail.
///
/// The reset link contains a live token, so the notice is logged at `debug`
/// and only the recipient is logged at `info`.
#[derive(Debug, Clone, Default)]
pub struct TracingResetNotifier;

impl TracingResetNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResetNotifier for TracingResetNotifier {
    async fn deliver(&self, notice: &PasswordResetNotice) -> Result<(), NotificationError> {
        let message = ResetNoticeMessage::from(notice);
        let payload = serde_json::to_string(&message)
            .map_err(|e| NotificationError::DeliveryFailed(e.to_string()))?;

        tracing::info!(
            to = %message.to,
            expires_at = %message.expires_at,
            "Password reset notice queued"
        );
        tracing::debug!(payload = %payload, "Password reset notice payload");

        Ok(())
    }
}
