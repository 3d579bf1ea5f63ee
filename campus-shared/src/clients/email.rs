use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email send failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Outgoing transactional mail. Message-specific helpers are provided on top
/// of `send_email` so every transport renders the same templates.
#[axum::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;

    async fn send_registration_confirmation(
        &self,
        to: &str,
        recipient_name: &str,
        event_title: &str,
        starts_at: DateTime<Utc>,
    ) -> Result<(), MailError> {
        let body = format!(
            r#"<p>Hello {name},</p>
            <p>Your registration for <strong>{title}</strong> is confirmed.</p>
            <p>The event starts on {date}.</p>"#,
            name = escape_html(recipient_name),
            title = escape_html(event_title),
            date = starts_at.format("%d/%m/%Y %H:%M UTC"),
        );
        self.send_email(to, &format!("Registration confirmed: {event_title}"), &layout("Registration confirmed", &body))
            .await
    }

    async fn send_certificate_issued(
        &self,
        to: &str,
        recipient_name: &str,
        activity_title: &str,
        verification_url: &str,
    ) -> Result<(), MailError> {
        let body = format!(
            r#"<p>Hello {name},</p>
            <p>Your attendance at <strong>{title}</strong> was confirmed and your certificate is available.</p>
            <p><a href="{url}" style="color: #1d4ed8;">View and verify your certificate</a></p>"#,
            name = escape_html(recipient_name),
            title = escape_html(activity_title),
            url = escape_html(verification_url),
        );
        self.send_email(to, &format!("Certificate available: {activity_title}"), &layout("Certificate issued", &body))
            .await
    }

    async fn send_event_reminder(
        &self,
        to: &str,
        recipient_name: &str,
        headline: &str,
        event_title: &str,
        starts_at: DateTime<Utc>,
        location: Option<&str>,
    ) -> Result<(), MailError> {
        let location = location
            .map(|l| format!("<p>Location: {}</p>", escape_html(l)))
            .unwrap_or_default();
        let body = format!(
            r#"<p>Hello {name},</p>
            <p><strong>{title}</strong> {headline}.</p>
            <p>Start: {date}</p>{location}"#,
            name = escape_html(recipient_name),
            title = escape_html(event_title),
            headline = escape_html(headline),
            date = starts_at.format("%d/%m/%Y %H:%M UTC"),
        );
        self.send_email(to, &format!("Reminder: {event_title} {headline}"), &layout("Event reminder", &body))
            .await
    }
}

/// Resend HTTP API client.
#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl EmailClient {
    pub fn new(api_key: &str, from_email: &str, from_name: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
        }
    }
}

#[axum::async_trait]
impl Mailer for EmailClient {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let request = ResendRequest {
            from: format!("{} <{}>", self.from_name, self.from_email),
            to: [to],
            subject,
            html,
        };

        let response = self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), body });
        }

        tracing::debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

/// Mailer used when delivery is switched off in configuration.
#[derive(Debug, Clone, Default)]
pub struct DisabledMailer;

#[axum::async_trait]
impl Mailer for DisabledMailer {
    async fn send_email(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
        tracing::debug!(to = %to, subject = %subject, "email delivery disabled, message dropped");
        Ok(())
    }
}

fn layout(heading: &str, body: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2 style="color: #1d4ed8;">{heading}</h2>
        {body}
        <p style="color: #666; margin-top: 20px;">This is an automated message, please do not reply.</p>
        </div>"#
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
