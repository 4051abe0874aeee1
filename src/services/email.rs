// src/services/email.rs
//! Outbound mail via AWS SES
//!
//! The only message this service knows how to send is the
//! password-reset link. Transport failures surface as `MailError` so
//! callers can report them distinctly from storage failures.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_sesv2::Client as SesClient;
use thiserror::Error;
use tracing::{error, info};

use crate::common::{safe_email_log, Config};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport not configured")]
    NotConfigured,

    #[error("failed to build message: {0}")]
    BuildFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),
}

pub struct MailService {
    from_email: Option<String>,
    region: String,
}

impl MailService {
    pub fn new(config: &Config) -> Self {
        Self {
            from_email: config.ses_from_email.clone(),
            region: config.ses_region.clone(),
        }
    }

    async fn ses_client(&self) -> SesClient {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await;

        SesClient::new(&aws_config)
    }

    /// Send an HTML email via SES
    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

        let from_email = self.from_email.as_deref().ok_or(MailError::NotConfigured)?;

        let client = self.ses_client().await;

        let destination = Destination::builder().to_addresses(to).build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::BuildFailed(format!("subject: {}", e)))?;

        let body_content = Content::builder()
            .data(html_body)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::BuildFailed(format!("body: {}", e)))?;

        let message = Message::builder()
            .subject(subject_content)
            .body(Body::builder().html(body_content).build())
            .build();

        let result = client
            .send_email()
            .from_email_address(from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = %safe_email_log(to), "Failed to send email via SES");
                MailError::SendFailed(e.to_string())
            })?;

        info!(
            to = %safe_email_log(to),
            message_id = ?result.message_id(),
            "Email sent via SES"
        );

        Ok(())
    }

    /// Send the password-reset link to a user.
    pub async fn send_reset_password_email(
        &self,
        to: &str,
        first_name: &str,
        reset_link: &str,
    ) -> Result<(), MailError> {
        let body = reset_password_email(first_name, reset_link);
        self.send(to, "Reset your password", &body).await
    }
}

/// HTML body for the password-reset email
pub fn reset_password_email(first_name: &str, reset_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #4F46E5; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Password Reset</h1>
        </div>
        <div class="content">
            <p>Hi {},</p>

            <p>We received a request to reset the password for your account. Click the button below to choose a new password. This link expires in one hour.</p>

            <p><a class="button" href="{}">Reset password</a></p>

            <p>If you did not request a password reset, you can safely ignore this email; your password will remain unchanged.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        first_name, reset_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_contains_link_and_name() {
        let body = reset_password_email("Jane", "https://app.example.com/reset-password/abc123");

        assert!(body.contains("Hi Jane,"));
        assert!(body.contains("https://app.example.com/reset-password/abc123"));
        assert!(body.contains("expires in one hour"));
    }
}
