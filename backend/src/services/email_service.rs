//! Outbound mail over SMTP.
//!
//! Delivery is best-effort: a misconfigured or unreachable relay is logged
//! and never fails the calling command. When SMTP is not configured the
//! service is a no-op, which is also the test posture.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{Config, DeploymentEnvironment};
use crate::errors::ServiceResult;

pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Option<Mailbox>,
}

impl EmailService {
    pub fn new(config: &Config) -> Self {
        if config.deployment_environment == DeploymentEnvironment::Test {
            tracing::info!("test environment, outbound mail disabled");
            return EmailService {
                transport: None,
                sender: None,
            };
        }

        let sender = config.smtp_sender.as_deref().and_then(|raw| {
            raw.parse::<Mailbox>()
                .map_err(|e| tracing::warn!(%e, "invalid SMTP_SENDER, mail disabled"))
                .ok()
        });

        let transport = match (&config.smtp_host, &sender) {
            (Some(host), Some(_)) => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map(|builder| builder.build())
                .map_err(|e| tracing::warn!(%e, "invalid SMTP_HOST, mail disabled"))
                .ok(),
            _ => None,
        };

        if transport.is_none() {
            tracing::info!("smtp not configured, outbound mail disabled");
        }
        EmailService { transport, sender }
    }

    pub async fn send(&self, to: &str, subject: &str, body_html: &str) -> ServiceResult<()> {
        let (Some(transport), Some(sender)) = (&self.transport, &self.sender) else {
            tracing::debug!(to, subject, "mail skipped, smtp disabled");
            return Ok(());
        };

        let recipient = match to.parse::<Mailbox>() {
            Ok(recipient) => recipient,
            Err(e) => {
                tracing::warn!(to, %e, "unmailable recipient address, mail skipped");
                return Ok(());
            }
        };

        let message = Message::builder()
            .from(sender.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body_html.to_string());

        match message {
            Ok(message) => {
                if let Err(e) = transport.send(message).await {
                    tracing::warn!(to, subject, %e, "mail delivery failed");
                }
            }
            Err(e) => tracing::warn!(to, subject, %e, "mail construction failed"),
        }
        Ok(())
    }
}
