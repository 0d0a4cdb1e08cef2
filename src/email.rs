use color_eyre::Result;
use serde::Serialize;

use crate::names;

/// Everything needed to render and address a results email.
#[derive(Debug, Clone)]
pub struct ResultEmail {
    pub to: String,
    pub user_name: Option<String>,
    pub quiz_title: String,
    pub result_title: String,
    pub email_content: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait EmailSender: Send + Sync {
    /// Whether email delivery is configured (false without an API key).
    fn is_enabled(&self) -> bool;

    fn send_result_email(
        &self,
        email: &ResultEmail,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn send_lead_notification(
        &self,
        to: &str,
        quiz_title: &str,
        lead_email: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

#[derive(Clone)]
pub struct ResendEmailSender {
    api_key: Option<String>,
    from_email: String,
    from_name: String,
    client: reqwest::Client,
}

impl ResendEmailSender {
    pub fn new(api_key: Option<String>, from_email: String, from_name: String) -> Self {
        Self {
            api_key,
            from_email,
            from_name,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: String, html: String) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            color_eyre::eyre::bail!("email delivery is not configured");
        };

        let body = SendEmailRequest {
            from: format!("{} <{}>", self.from_name, self.from_email),
            to: vec![to.to_string()],
            subject,
            html,
        };

        let resp = self
            .client
            .post(names::RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("Resend API error: {status} - {text}");
            color_eyre::eyre::bail!("Resend API returned {status}");
        }

        Ok(())
    }
}

impl EmailSender for ResendEmailSender {
    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send_result_email(&self, email: &ResultEmail) -> Result<()> {
        let subject = format!("Your Quiz Results: {}", email.result_title);
        self.send(&email.to, subject, build_result_email_html(email))
            .await?;

        tracing::info!("result email sent to {}", email.to);
        Ok(())
    }

    async fn send_lead_notification(
        &self,
        to: &str,
        quiz_title: &str,
        lead_email: &str,
    ) -> Result<()> {
        let subject = format!("New lead from quiz: {quiz_title}");
        let html = format!(
            r#"<h2>New lead captured</h2>
<p>A quiz taker just completed <strong>{quiz_title}</strong> with a lead result.</p>
<p>Contact: {lead_email}</p>"#
        );
        self.send(to, subject, html).await?;

        tracing::info!("lead notification sent to {to}");
        Ok(())
    }
}

/// Wrap the result's admin-authored email body in the standard template.
pub fn build_result_email_html(email: &ResultEmail) -> String {
    let greeting = match &email.user_name {
        Some(name) => format!("Hi {name},"),
        None => "Hi there,".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Your Quiz Results</title>
</head>
<body style="font-family: sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="text-align: center; padding-bottom: 20px; border-bottom: 1px solid #eee;">
    <h1 style="color: #3b82f6; font-size: 24px; margin: 0;">{result_title}</h1>
    <p style="color: #666; font-size: 14px; margin-top: 5px;">{quiz_title}</p>
  </div>
  <p>{greeting}</p>
  <p>Thank you for completing the quiz! Here are your personalized results:</p>
  <div style="padding: 20px 0;">
    {content}
  </div>
  <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; font-size: 12px; color: #666; text-align: center;">
    <p>This email was sent because you completed a quiz.</p>
  </div>
</body>
</html>"#,
        result_title = email.result_title,
        quiz_title = email.quiz_title,
        content = email.email_content,
    )
}
