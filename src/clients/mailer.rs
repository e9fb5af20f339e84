//! SMTP notifier for the run summary and failure alerts.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::clients::Notifier;
use crate::config::Config;
use crate::error::TransportError;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let credentials = Credentials::new(
            config.smtp.username.clone(),
            config.smtp.password.expose().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.host)?
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from: config.smtp.from.parse()?,
            to: config.smtp.to.parse()?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(body.to_string())?;
        self.transport.send(message).await?;
        info!("📧 Sent \"{subject}\" to {}", self.to);
        Ok(())
    }
}
