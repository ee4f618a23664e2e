//! Posts broadcasts to the shared channel through an incoming webhook.

use anyhow::{Result, anyhow};
use serde::Serialize;

#[derive(Serialize)]
struct AllowedMentions {
    parse: Vec<&'static str>,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions,
}

#[derive(Debug, Clone)]
pub struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Webhook {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub async fn send(&self, content: &str) -> Result<()> {
        // Only user mentions ping, so "@everyone" in a title stays inert
        let message = WebhookMessage {
            content,
            allowed_mentions: AllowedMentions {
                parse: vec!["users"],
            },
        };

        let resp = self.client.post(&self.url).json(&message).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Webhook returned {}: {}", status, body));
        }

        Ok(())
    }
}
