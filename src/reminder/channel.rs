//! Outbound notification channels for reminder dispatch.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::VoiceCallConfig;

/// Notification channel contract. Delivery is fire-and-forget per
/// recipient: an error covers one attempt only and never the batch.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable channel identifier (e.g. `voice`).
    fn id(&self) -> &'static str;

    /// Deliver `text` to a single recipient address.
    async fn deliver(&self, recipient: &str, text: &str) -> anyhow::Result<()>;
}

/// Outcome of one delivery attempt to one recipient.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub channel: &'static str,
    pub recipient: String,
    pub result: anyhow::Result<()>,
}

impl DeliveryOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Attempt delivery of `text` to every recipient on every channel.
///
/// Never aborts the batch: each failure is captured in its outcome entry
/// and the remaining recipients are still attempted.
pub async fn deliver_to_all(
    channels: &[Arc<dyn NotificationChannel>],
    recipients: &[String],
    text: &str,
) -> Vec<DeliveryOutcome> {
    let mut outcomes = Vec::with_capacity(channels.len() * recipients.len());
    for channel in channels {
        for recipient in recipients {
            let result = channel.deliver(recipient, text).await;
            outcomes.push(DeliveryOutcome {
                channel: channel.id(),
                recipient: recipient.clone(),
                result,
            });
        }
    }
    outcomes
}

/// Voice-call channel over a Twilio-compatible REST API.
///
/// Places one call per recipient that reads the reminder text aloud.
#[derive(Clone)]
pub struct VoiceCallChannel {
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct CallResponse {
    #[serde(default)]
    sid: Option<String>,
}

impl VoiceCallChannel {
    pub fn new(config: &VoiceCallConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for VoiceCallChannel {
    fn id(&self) -> &'static str {
        "voice"
    }

    async fn deliver(&self, recipient: &str, text: &str) -> anyhow::Result<()> {
        if self.account_sid.trim().is_empty() {
            anyhow::bail!("voice account sid is empty");
        }
        if self.auth_token.trim().is_empty() {
            anyhow::bail!("voice auth token is empty");
        }

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base, self.account_sid
        );
        let twiml = format!("<Response><Say>{}</Say></Response>", xml_escape(text));
        let form = [
            ("To", recipient),
            ("From", self.from_number.as_str()),
            ("Twiml", twiml.as_str()),
        ];
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("voice call failed ({status}): {body}");
        }

        if let Ok(call) = response.json::<CallResponse>().await {
            if let Some(sid) = call.sid {
                tracing::info!(%recipient, sid, "voice call placed");
            }
        }

        Ok(())
    }
}

/// Minimal escaping for text embedded in the TwiML `<Say>` body.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
