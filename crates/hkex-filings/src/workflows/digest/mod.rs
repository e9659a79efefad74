mod email;
mod mailer;
mod payload;
mod store;

pub use email::{format_email, EmailContent};
pub use mailer::{MailError, MailGateway, OutgoingMail, SmtpMailer};
pub use payload::{DigestPayload, DEFAULT_SOURCE};
pub use store::{DigestStore, SavedDigest, StoreError};

use tracing::info;

use crate::config::MailConfig;

/// Formats a stored digest and hands it to the configured mail gateway.
#[derive(Debug)]
pub struct DigestPublisher {
    mail: Box<dyn MailGateway>,
    from: String,
    recipients: Vec<String>,
}

impl DigestPublisher {
    pub fn new(mail: Box<dyn MailGateway>, from: String, recipients: Vec<String>) -> Self {
        Self {
            mail,
            from,
            recipients,
        }
    }

    pub fn smtp(config: &MailConfig) -> Result<Self, MailError> {
        let mailer = SmtpMailer::new(config)?;
        Ok(Self::new(
            Box::new(mailer),
            config.from.clone(),
            config.recipients.clone(),
        ))
    }

    pub fn publish(&self, payload: &DigestPayload) -> Result<EmailContent, MailError> {
        let content = format_email(payload);
        let outgoing = OutgoingMail {
            from: self.from.clone(),
            to: self.recipients.clone(),
            subject: content.subject.clone(),
            body: content.body.clone(),
        };

        self.mail.send(&outgoing)?;
        info!(
            subject = %content.subject,
            recipients = self.recipients.len(),
            count = payload.count,
            "digest email sent"
        );
        Ok(content)
    }
}
