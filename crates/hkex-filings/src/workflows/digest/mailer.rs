use std::fmt::Debug;
use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};

use crate::config::MailConfig;

const IMPLICIT_TLS_PORT: u16 = 465;
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("no recipients configured")]
    NoRecipients,
    #[error("unable to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

pub trait MailGateway: Debug {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// SMTP delivery via lettre. Port 465 speaks TLS from the first byte; any
/// other port upgrades with STARTTLS when the server offers it.
pub struct SmtpMailer {
    transport: SmtpTransport,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let tls_parameters = TlsParameters::new(config.host.clone())?;
        let tls = if config.port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let transport = SmtpTransport::builder_dangerous(config.host.as_str())
            .port(config.port)
            .tls(tls)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            host: config.host.clone(),
            port: config.port,
        })
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl MailGateway for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = build_message(mail)?;
        self.transport.send(&message)?;
        Ok(())
    }
}

pub(crate) fn build_message(mail: &OutgoingMail) -> Result<Message, MailError> {
    if mail.to.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &mail.to {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    Ok(builder.body(mail.body.clone())?)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse::<Mailbox>().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &[&str]) -> OutgoingMail {
        OutgoingMail {
            from: "Digest Bot <bot@example.com>".to_string(),
            to: to.iter().map(|addr| addr.to_string()).collect(),
            subject: "[HKEX AP] 2026-10-17 新增 1 家".to_string(),
            body: "港交所前一日递表名单（AP）".to_string(),
        }
    }

    #[test]
    fn builds_utf8_message_for_every_recipient() {
        let message = build_message(&mail(&["a@example.com", "b@example.com"])).expect("message");
        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(|addr| addr.to_string()).as_deref(),
            Some("bot@example.com")
        );
        let formatted = String::from_utf8(message.formatted()).expect("utf-8 output");
        assert!(formatted.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn rejects_invalid_addresses_and_empty_recipient_lists() {
        match build_message(&mail(&["not-an-address"])) {
            Err(MailError::Address { address, .. }) => assert_eq!(address, "not-an-address"),
            other => panic!("expected address error, got {other:?}"),
        }
        assert!(matches!(build_message(&mail(&[])), Err(MailError::NoRecipients)));
    }
}
