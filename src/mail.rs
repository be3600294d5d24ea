use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{error, info};
use serde::Serialize;
use thiserror::Error;

use crate::config::{MailConfig, SmtpConfig};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {0}")]
    Address(String),
    #[error("cannot build message: {0}")]
    Build(String),
    #[error("smtp relay failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Used when no relay is configured: messages only show up in the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!("mail to {} ({}) not sent: no relay configured", message.to, message.subject);
        Ok(())
    }
}

/// Plain-text mail through an SMTP relay, generic over the lettre transport.
pub struct SmtpMailer<T = AsyncSmtpTransport<Tokio1Executor>> {
    transport: T,
    from: Mailbox,
}

fn mailbox(addr: &str) -> Result<Mailbox, MailError> {
    addr.parse().map_err(|_| MailError::Address(addr.to_string()))
}

impl SmtpMailer {
    /// Build a pooled relay transport. Nothing connects until the first send.
    pub fn relay(cfg: &SmtpConfig, from: &str) -> Result<Self, MailError> {
        let builder = if cfg.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
        };
        let mut builder = builder.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self { transport: builder.build(), from: mailbox(from)? })
    }
}

impl<T> SmtpMailer<T> {
    pub fn with_transport(transport: T, from: &str) -> Result<Self, MailError> {
        Ok(Self { transport, from: mailbox(from)? })
    }

    fn build(&self, message: MailMessage) -> Result<Message, MailError> {
        Message::builder()
            .from(self.from.clone())
            .to(mailbox(&message.to)?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.text)
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl<T> Mailer for SmtpMailer<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: std::fmt::Display,
{
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let email = self.build(message)?;
        self.transport.send(email).await.map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    Ok(match &cfg.smtp {
        Some(smtp) => Arc::new(SmtpMailer::relay(smtp, &cfg.from)?),
        None => Arc::new(LogMailer),
    })
}

/// Send in the background. Failures are logged and never retried.
pub fn dispatch(mailer: Arc<dyn Mailer>, messages: Vec<MailMessage>) {
    if messages.is_empty() {
        return;
    }
    actix_web::rt::spawn(async move {
        for message in messages {
            let to = message.to.clone();
            if let Err(e) = mailer.send(message).await {
                error!("failed to send mail to {to}: {e}");
            }
        }
    });
}
