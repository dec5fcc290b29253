//! Outbound mail

use async_trait::async_trait;

use crate::error::{GatewayError, GatewayResult};

/// One HTML message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub subject: String,
    pub to: String,
    pub from: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> GatewayResult<()>;
}

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// e.g. `https://api.mailgun.net/v3`
    pub api_base: String,
    pub domain: String,
    pub api_key: String,
    pub sender: String,
}

/// Mailgun HTTP API (`POST /{domain}/messages`, basic auth `api:{key}`)
#[derive(Clone)]
pub struct MailgunMailer {
    http: reqwest::Client,
    config: MailgunConfig,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn sender(&self) -> &str {
        &self.config.sender
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.domain
        )
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, mail: &Mail) -> GatewayResult<()> {
        let form = [
            ("from", mail.from.as_str()),
            ("to", mail.to.as_str()),
            ("subject", mail.subject.as_str()),
            ("html", mail.html.as_str()),
        ];

        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Mail(format!("{}: {}", status, body)));
        }

        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}

/// Writes mail to the log instead of delivering it
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> GatewayResult<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mail delivery disabled, message dropped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let mailer = MailgunMailer::new(MailgunConfig {
            api_base: "https://api.mailgun.net/v3/".into(),
            domain: "mg.example.com".into(),
            api_key: "key".into(),
            sender: "noreply@example.com".into(),
        });
        assert_eq!(
            mailer.messages_url(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );
    }
}
