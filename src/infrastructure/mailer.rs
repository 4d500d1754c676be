//! Operator notification transports.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;

use crate::config::SmtpConfig;
use crate::domain::errors::NotificationError;
use crate::domain::ports::{NotificationSender, OutboundMessage};

/// Plain-text mail over an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct SmtpNotificationSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotificationSender {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

pub fn build_message(
    from: &str,
    to: &str,
    message: &OutboundMessage,
) -> Result<Message, NotificationError> {
    Message::builder()
        .from(
            from.parse()
                .map_err(|_| NotificationError::InvalidAddress(from.to_string()))?,
        )
        .to(to
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(to.to_string()))?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| NotificationError::Message(e.to_string()))
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), NotificationError> {
        let email = build_message(&self.from_address, recipient, message)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Used when no SMTP relay is configured: the alert only reaches the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(
        &self,
        recipient: &str,
        message: &OutboundMessage,
    ) -> Result<(), NotificationError> {
        info!("Notification for {}: {}\n{}", recipient, message.subject, message.body);
        Ok(())
    }
}
