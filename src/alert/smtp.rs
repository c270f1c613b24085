//! SMTP delivery for crisis alerts

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use super::{AlertSink, CrisisAlert};
use crate::{Error, Result};

/// SMTP relay settings
#[derive(Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender address
    pub from: String,
    /// Alert recipients
    pub recipients: Vec<String>,
}

/// Sends alerts as plain-text email over a STARTTLS relay
pub struct SmtpAlertSink {
    transport: SmtpTransport,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpAlertSink {
    /// Build the sink, validating addresses up front
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid, no recipient is given, or
    /// the relay cannot be configured
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| Error::Config(format!("invalid alert sender address: {e}")))?;

        let recipients = config
            .recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .map_err(|e| Error::Config(format!("invalid alert recipient {r:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if recipients.is_empty() {
            return Err(Error::Config(
                "at least one alert recipient is required".to_string(),
            ));
        }

        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| Error::Config(format!("SMTP setup failed: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        tracing::info!(
            host = %config.host,
            port = config.port,
            recipients = recipients.len(),
            "SMTP alert delivery configured"
        );

        Ok(Self {
            transport,
            from,
            recipients,
        })
    }

    fn build_message(&self, alert: &CrisisAlert) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(alert.subject())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(alert.body())
            .map_err(|e| Error::Alert(format!("failed to build email: {e}")))
    }
}

#[async_trait]
impl AlertSink for SmtpAlertSink {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn dispatch(&self, alert: &CrisisAlert) -> Result<()> {
        let email = self.build_message(alert)?;
        let transport = self.transport.clone();

        // lettre's SmtpTransport blocks; keep it off the runtime workers
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| Error::Alert(format!("SMTP task failed: {e}")))?
            .map_err(|e| Error::Alert(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Turn;

    fn config(recipients: &[&str]) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "alerts@example.com".to_string(),
            password: SecretString::from("hunter2".to_string()),
            from: "alerts@example.com".to_string(),
            recipients: recipients.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_requires_recipient() {
        let result = SmtpAlertSink::new(&config(&[]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("recipient")));
    }

    #[test]
    fn test_rejects_invalid_address() {
        let result = SmtpAlertSink::new(&config(&["not an address"]));
        assert!(matches!(result, Err(Error::Config(_))));

        let mut bad_from = config(&["care@example.com"]);
        bad_from.from = "nope".to_string();
        assert!(SmtpAlertSink::new(&bad_from).is_err());
    }

    #[test]
    fn test_message_addresses_every_recipient() {
        let sink =
            SmtpAlertSink::new(&config(&["care@example.com", "oncall@example.com"])).unwrap();
        let alert =
            CrisisAlert::new("Jennifer White", "help", "I'm here.", vec![Turn::user("help")]);

        let message = sink.build_message(&alert).unwrap();
        let to: Vec<String> = message.envelope().to().iter().map(ToString::to_string).collect();
        assert_eq!(to, vec!["care@example.com", "oncall@example.com"]);

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("Content-Type: text/plain"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config(&["care@example.com"]));
        assert!(!rendered.contains("hunter2"));
    }
}
