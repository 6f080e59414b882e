//! SMTP email notifier via `lettre` with TLS support.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use idxwatch_core::EmailConfig;

use crate::summary::{render_body, AnomalySummary};
use crate::traits::{Notifier, NotifyError};

/// Sends one anomaly summary email per run to the configured recipients.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from email configuration.
    ///
    /// Port 465 uses implicit TLS; other ports use STARTTLS when TLS is
    /// enabled. SMTP credentials are resolved from the `SMTP_USERNAME` and
    /// `SMTP_PASSWORD` environment variables; without them the connection is
    /// unauthenticated.
    pub fn from_config(cfg: &EmailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = cfg
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let to: Vec<Mailbox> = cfg
            .recipients
            .iter()
            .map(|addr| {
                addr.parse()
                    .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let mut builder = if cfg.smtp_port == 465 || cfg.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(cfg.smtp_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.smtp_host)
                .port(cfg.smtp_port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, summary: &AnomalySummary) -> Result<(), NotifyError> {
        let body = render_body(summary)?;

        let mut message_builder = Message::builder().from(self.from.clone());
        for recipient in &self.to {
            message_builder = message_builder.to(recipient.clone());
        }

        let email = message_builder
            .subject(summary.subject())
            .body(body)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            scope = %summary.scope,
            anomalies = summary.totals.total(),
            recipients = self.to.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
