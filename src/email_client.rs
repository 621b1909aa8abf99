/// Outbound mail with a transactional HTTP provider as the primary
/// transport and an SMTP relay as the fallback.
///
/// Sending is at-most-once best-effort: each transport attempt runs under
/// a bounded timeout, failures are logged and reported as a `false`
/// result, and no auth flow ever aborts because a provider was down.
/// With neither transport configured the mailer runs in no-op mode and
/// only logs, which is what tests and local development want.
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;

use crate::configuration::MailSettings;
use crate::error::ApiError;

pub struct Mailer {
    api: Option<ApiTransport>,
    smtp: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    domain: String,
}

struct ApiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct Party<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    sender: Party<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    #[serde(rename = "htmlContent")]
    html_content: &'a str,
}

impl Mailer {
    pub fn new(settings: &MailSettings) -> Result<Self, ApiError> {
        let timeout = std::time::Duration::from_secs(settings.send_timeout_seconds);

        let from = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse::<Mailbox>()
            .map_err(|e| ApiError::Internal(format!("invalid mail from address: {}", e)))?;

        let api = match (&settings.api_base_url, &settings.api_key) {
            (Some(base_url), Some(api_key)) => Some(ApiTransport {
                client: reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .map_err(|e| {
                        ApiError::Internal(format!("failed to build mail HTTP client: {}", e))
                    })?,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
            }),
            _ => None,
        };

        let smtp = match &settings.smtp_host {
            Some(host) if !host.trim().is_empty() => {
                let builder = if settings.smtp_starttls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                }
                .map_err(|e| {
                    ApiError::Internal(format!("failed to configure SMTP transport: {}", e))
                })?
                .port(settings.smtp_port)
                .timeout(Some(timeout));

                let builder = if let (Some(username), Some(password)) =
                    (&settings.smtp_username, &settings.smtp_password)
                {
                    builder.credentials(Credentials::new(username.clone(), password.clone()))
                } else {
                    builder
                };

                Some(builder.build())
            }
            _ => None,
        };

        if api.is_none() && smtp.is_none() {
            tracing::warn!("no mail transport configured; mailer will log and drop messages");
        }

        Ok(Self {
            api,
            smtp,
            from,
            domain: settings.domain.trim_end_matches('/').to_string(),
        })
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/api/v1/users/verify?token={}", self.domain, token)
    }

    pub fn password_reset_link(&self, token: &str) -> String {
        format!("{}/api/v1/users/password-reset-confirm/{}", self.domain, token)
    }

    /// Send a message, trying the HTTP provider first and falling back
    /// to SMTP. Returns whether any transport accepted the message; in
    /// no-op mode the message is logged and counted as sent.
    pub async fn send(&self, recipients: &[String], subject: &str, html_body: &str) -> bool {
        if self.api.is_none() && self.smtp.is_none() {
            tracing::info!(
                recipients = recipients.len(),
                subject = %subject,
                "mail transport disabled; message suppressed"
            );
            return true;
        }

        if let Some(api) = &self.api {
            match self.send_via_api(api, recipients, subject, html_body).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(error = %e, "HTTP mail provider failed; falling back to SMTP")
                }
            }
        }

        if let Some(smtp) = &self.smtp {
            match self.send_via_smtp(smtp, recipients, subject, html_body).await {
                Ok(()) => return true,
                Err(e) => tracing::error!(error = %e, "SMTP send failed"),
            }
        }

        tracing::error!(
            recipients = recipients.len(),
            subject = %subject,
            "failed to send email via every configured transport"
        );
        false
    }

    async fn send_via_api(
        &self,
        api: &ApiTransport,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), String> {
        let url = format!("{}/v3/smtp/email", api.base_url);
        let from_email = self.from.email.to_string();
        let request = SendEmailRequest {
            sender: Party {
                name: self.from.name.as_deref().unwrap_or(""),
                email: &from_email,
            },
            to: recipients.iter().map(|r| Recipient { email: r }).collect(),
            subject,
            html_content: html_body,
        };

        let response = api
            .client
            .post(&url)
            .header("api-key", &api.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("mail provider request failed: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!(
                "mail provider returned status {}",
                response.status()
            ))
        }
    }

    async fn send_via_smtp(
        &self,
        smtp: &AsyncSmtpTransport<Tokio1Executor>,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), String> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);

        for recipient in recipients {
            let mailbox = recipient
                .parse::<Mailbox>()
                .map_err(|e| format!("invalid recipient {}: {}", recipient, e))?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .body(html_body.to_string())
            .map_err(|e| format!("failed to build message: {}", e))?;

        smtp.send(message)
            .await
            .map(|_| ())
            .map_err(|e| format!("smtp transport error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::MailSettings;

    fn noop_settings() -> MailSettings {
        MailSettings {
            api_base_url: None,
            api_key: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_starttls: true,
            smtp_username: None,
            smtp_password: None,
            from_address: "noreply@bookworm.dev".to_string(),
            from_name: "Bookworm".to_string(),
            send_timeout_seconds: 10,
            domain: "http://localhost:8000/".to_string(),
        }
    }

    #[tokio::test]
    async fn noop_mailer_counts_as_sent() {
        let mailer = Mailer::new(&noop_settings()).expect("failed to build mailer");
        assert!(
            mailer
                .send(&["reader@example.com".to_string()], "Hello", "<p>Hi</p>")
                .await
        );
    }

    #[test]
    fn links_use_the_configured_domain_without_double_slash() {
        let mailer = Mailer::new(&noop_settings()).unwrap();
        assert_eq!(
            mailer.verification_link("tok"),
            "http://localhost:8000/api/v1/users/verify?token=tok"
        );
        assert_eq!(
            mailer.password_reset_link("tok"),
            "http://localhost:8000/api/v1/users/password-reset-confirm/tok"
        );
    }

    #[test]
    fn invalid_from_address_is_rejected() {
        let mut settings = noop_settings();
        settings.from_address = "not an address".to_string();
        assert!(Mailer::new(&settings).is_err());
    }

    #[test]
    fn api_request_body_shape() {
        let request = SendEmailRequest {
            sender: Party {
                name: "Bookworm",
                email: "noreply@bookworm.dev",
            },
            to: vec![Recipient {
                email: "reader@example.com",
            }],
            subject: "Verify your account",
            html_content: "<p>Hi</p>",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sender"]["email"], "noreply@bookworm.dev");
        assert_eq!(json["to"][0]["email"], "reader@example.com");
        assert_eq!(json["htmlContent"], "<p>Hi</p>");
    }
}
