use crate::config::EmailConfig;
use crate::error::app_error::AppError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Forward a contact-form inquiry to the configured recipient. When the
    /// service is disabled the inquiry is logged and the request succeeds.
    pub async fn send_contact_inquiry(
        &self,
        recipient: &str,
        sender_name: &str,
        reply_to: &str,
        message: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::warn!(
                sender = %sender_name,
                reply_to = %reply_to,
                "Email service is disabled, contact inquiry logged only"
            );
            return Ok(());
        }

        let subject = format!("Catalog inquiry from {}", sender_name);
        let html_body = self.inquiry_html(sender_name, reply_to, message);
        let text_body = self.inquiry_text(sender_name, reply_to, message);

        self.send_email(recipient, reply_to, &subject, &html_body, &text_body).await
    }

    fn inquiry_html(&self, sender_name: &str, reply_to: &str, message: &str) -> String {
        let escaped = ammonia::clean_text(message);
        format!(
            r#"<html>
<body style="font-family: sans-serif; color: #1d1d1f;">
  <h2 style="margin-bottom: 4px;">New catalog inquiry</h2>
  <p style="margin-top: 0; color: #6e6e73;">From {sender} &lt;{reply}&gt;</p>
  <blockquote style="border-left: 3px solid #d2d2d7; margin: 0; padding: 4px 12px; white-space: pre-wrap;">{body}</blockquote>
</body>
</html>
"#,
            sender = ammonia::clean_text(sender_name),
            reply = ammonia::clean_text(reply_to),
            body = escaped
        )
    }

    fn inquiry_text(&self, sender_name: &str, reply_to: &str, message: &str) -> String {
        format!(
            "New catalog inquiry\n\nFrom: {} <{}>\n\n{}\n",
            sender_name, reply_to, message
        )
    }

    /// Send an email using SMTP
    async fn send_email(
        &self,
        to_email: &str,
        reply_to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_address)
                    .parse()
                    .map_err(|e| AppError::Email(format!("Invalid from address: {}", e)))?,
            )
            .reply_to(reply_to.parse().map_err(|e| AppError::Email(format!("Invalid reply-to address: {}", e)))?)
            .to(to_email.parse().map_err(|e| AppError::Email(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))?;

        let creds = Credentials::new(self.config.smtp_username.clone(), self.config.smtp_password.clone());

        let mailer = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| AppError::Email(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(creds)
            .port(self.config.smtp_port)
            .build();

        // Blocking transport, so run it off the async workers.
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Email(format!("Failed to spawn email sending task: {}", e)))?;

        result.map_err(|e| AppError::Email(format!("Failed to send email: {}", e)))?;

        tracing::info!("Contact inquiry forwarded to {}", to_email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            from_address: "noreply@showroom.local".to_string(),
            from_name: "Showroom".to_string(),
        }
    }

    #[test]
    fn inquiry_html_escapes_message_body() {
        let service = EmailService::new(test_config());
        let html = service.inquiry_html("Jo", "jo@example.com", "<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("jo@example.com"));
    }

    #[test]
    fn inquiry_text_carries_reply_address() {
        let service = EmailService::new(test_config());
        let text = service.inquiry_text("Jo", "jo@example.com", "Do you stock OEM-77?");
        assert!(text.contains("Jo <jo@example.com>"));
        assert!(text.contains("OEM-77"));
    }

    #[tokio::test]
    async fn disabled_service_short_circuits() {
        let service = EmailService::new(test_config());
        let result = service
            .send_contact_inquiry("sales@showroom.local", "Jo", "jo@example.com", "hi")
            .await;
        assert!(result.is_ok());
    }
}
