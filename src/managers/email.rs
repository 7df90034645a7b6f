use crate::config::Config;
use crate::constants::email::{DEFAULT_SUBJECT, SIGNATURE};
use crate::constants::limits::LOG_SUBSTRING_LENGTH;
use crate::errors::GatewayError;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::text::{escape_html, preview};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub form_data: Option<Value>,
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
struct MailrelayMessage<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    html: String,
    text: &'a str,
}

/// `key: <json>` lines wrapped in the submission template.
pub fn render_submission(form_data: &Map<String, Value>) -> String {
    let lines: Vec<String> = form_data
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    format!(
        "New form submission received:\n\n{}\n\n---\n{}",
        lines.join("\n"),
        SIGNATURE
    )
}

pub fn render_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

#[derive(Clone)]
pub struct EmailManager {
    logger: Logger,
    config: Arc<Config>,
    validation: Validation,
    client: Client,
}

impl EmailManager {
    pub fn new(logger: Logger, config: Arc<Config>, validation: Validation, client: Client) -> Self {
        Self {
            logger: logger.child("email"),
            config,
            validation,
            client,
        }
    }

    pub async fn send_form_data(&self, body: &Bytes) -> Result<Value, GatewayError> {
        let request: EmailRequest = serde_json::from_slice(body)?;

        let to = request.to.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let form_data = request.form_data.as_ref().filter(|v| !v.is_null());
        let (Some(to), Some(form_data)) = (to, form_data) else {
            return Err(GatewayError::invalid_params(
                "Missing required fields: to and formData",
            ));
        };
        if !self.validation.is_email(to) {
            return Err(GatewayError::invalid_params("Invalid email format"));
        }
        let form_data = self.validation.ensure_object(form_data, "formData")?;

        let mailrelay = &self.config.mailrelay;
        let (Some(api_key), Some(send_url)) = (mailrelay.api_key.as_deref(), mailrelay.send_url())
        else {
            self.logger.error("Mailrelay credentials missing", None);
            return Err(GatewayError::internal("Email service not configured"));
        };

        let text = render_submission(&form_data);
        let message = MailrelayMessage {
            to,
            from: request
                .from
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .unwrap_or(mailrelay.default_from.as_str()),
            subject: request
                .subject
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SUBJECT),
            html: render_html(&text),
            text: &text,
        };

        let response = self
            .client
            .post(&send_url)
            .bearer_auth(api_key)
            .json(&message)
            .send()
            .await
            .map_err(|err| {
                self.logger.error(
                    "Mailrelay unreachable",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
                GatewayError::upstream("Failed to reach email service").with_hint(err.to_string())
            })?;

        let status = response.status();
        let raw = response.text().await.unwrap_or_default();
        if !status.is_success() {
            self.logger.error(
                "Mailrelay API error",
                Some(&serde_json::json!({
                    "status": status.as_u16(),
                    "body": preview(&raw, LOG_SUBSTRING_LENGTH),
                })),
            );
            return Err(GatewayError::internal(format!(
                "Mailrelay API error: {}",
                status.as_u16()
            ))
            .with_hint("Failed to send email"));
        }

        let message_id = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(|v| v.get("messageId").cloned())
            .and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "unknown".to_string());
        self.logger.info(
            "Email sent",
            Some(&serde_json::json!({ "messageId": message_id })),
        );
        Ok(serde_json::json!({
            "success": true,
            "message": "Email sent successfully",
            "messageId": message_id,
        }))
    }
}
