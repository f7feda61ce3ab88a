//! Confirmation email delivery over SMTP.
//!
//! One delivery attempt per submission; failures are reported to the
//! caller and never touch any other component's state.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, Mailbox, Message, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::fmt;

use crate::config::MailConfig;

pub mod template;

pub use template::{compose, AttachmentSpec, EmailContent};

/// Notifier failures
#[derive(Debug)]
pub enum MailerError {
    /// A recipient or sender address did not parse
    InvalidAddress(String),

    /// Message assembly failed
    Compose(lettre::error::Error),

    /// Attachment content type did not parse
    ContentType(lettre::message::header::ContentTypeErr),

    /// The transport was unreachable or rejected the message
    DeliveryFailed(lettre::transport::smtp::Error),
}

impl fmt::Display for MailerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailerError::InvalidAddress(addr) => write!(f, "invalid address: {}", addr),
            MailerError::Compose(e) => write!(f, "failed to compose message: {}", e),
            MailerError::ContentType(e) => write!(f, "bad attachment content type: {}", e),
            MailerError::DeliveryFailed(e) => write!(f, "delivery failed: {}", e),
        }
    }
}

impl std::error::Error for MailerError {}

/// SMTP-backed notifier
#[derive(Clone, Debug)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    bcc: Option<Mailbox>,
}

impl Mailer {
    /// Build a notifier from configured credentials.
    ///
    /// `bcc`, when set, blind-copies an internal address on every
    /// confirmation.
    pub fn from_config(mail: &MailConfig, bcc: Option<&str>) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)
            .map_err(MailerError::DeliveryFailed)?
            .port(mail.smtp_port)
            .credentials(Credentials::new(
                mail.username.clone(),
                mail.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(&mail.from_address)?,
            bcc: bcc.map(parse_mailbox).transpose()?,
        })
    }

    /// Plaintext transport without authentication, for local relays and
    /// test harnesses.
    pub fn unencrypted(host: &str, port: u16, from_address: &str) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(from_address)?,
            bcc: None,
        })
    }

    /// Send a composed confirmation to `to`, with the resume bytes attached
    /// when both the descriptor and the bytes are available.
    ///
    /// Exactly one delivery attempt is made; there is no retry.
    pub async fn send_confirmation(
        &self,
        to: &str,
        content: &EmailContent,
        attachment_bytes: Option<Vec<u8>>,
    ) -> Result<(), MailerError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to)?)
            .subject(content.subject.clone());

        if let Some(bcc) = &self.bcc {
            builder = builder.bcc(bcc.clone());
        }

        let alternative = MultiPart::alternative_plain_html(
            content.text_body.clone(),
            content.html_body.clone(),
        );

        let message = match (&content.attachment, attachment_bytes) {
            (Some(spec), Some(bytes)) => {
                let content_type =
                    ContentType::parse(&spec.content_type).map_err(MailerError::ContentType)?;
                let attachment =
                    Attachment::new(spec.filename.clone()).body(Body::new(bytes), content_type);

                builder
                    .multipart(
                        MultiPart::mixed()
                            .multipart(alternative)
                            .singlepart(attachment),
                    )
                    .map_err(MailerError::Compose)?
            }
            _ => builder.multipart(alternative).map_err(MailerError::Compose)?,
        };

        self.transport
            .send(message)
            .await
            .map_err(MailerError::DeliveryFailed)?;

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse()
        .map_err(|_| MailerError::InvalidAddress(address.to_string()))
}
