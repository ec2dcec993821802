//! Outgoing account emails.
//!
//! Delivery is a collaborator behind [`Mailer`]. The bundled [`LogMailer`]
//! only logs what would have been sent, which is enough for development.

use async_trait::async_trait;
use imageshare_model::UserID;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    EmailVerification { user_id: UserID, token: String },
    PasswordReset { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub username: String,
    pub template: MailTemplate,
    /// Link the recipient follows to complete the action
    pub action_url: String,
}

impl OutgoingMail {
    pub fn subject(&self) -> &'static str {
        match self.template {
            MailTemplate::EmailVerification { .. } => "Please confirm your email",
            MailTemplate::PasswordReset { .. } => "Your password reset request",
        }
    }

    pub fn body(&self) -> String {
        match self.template {
            MailTemplate::EmailVerification { .. } => format!(
                "Hi {},\n\nConfirm your email address by opening:\n{}\n\n\
                 This link expires in 24 hours.\n",
                self.username, self.action_url
            ),
            MailTemplate::PasswordReset { .. } => format!(
                "Hi {},\n\nReset your password by opening:\n{}\n\nThis link expires in 1 hour. \
                 If you did not ask for a reset you can ignore this message.\n",
                self.username, self.action_url
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(
            to = %mail.to,
            subject = mail.subject(),
            action_url = %mail.action_url,
            "mail delivery stub"
        );
        Ok(())
    }
}
