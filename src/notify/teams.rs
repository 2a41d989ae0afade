//! Microsoft Teams incoming-webhook notifications.

use log::info;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{review_message, snapshot_message, Block, Message, Notifier};
use crate::error::{Error, Result};
use crate::repository::{RatingSnapshot, ReviewRecord};

const CHANNEL: &str = "teams";

/// Posts each message as a MessageCard to a webhook URL.
pub struct TeamsNotifier {
    client: Client,
    hook_url: String,
}

impl TeamsNotifier {
    pub fn new(hook_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Notify {
                channel: CHANNEL,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            hook_url: hook_url.into(),
        })
    }

    fn send(&self, message: &Message) -> Result<()> {
        info!("Sending to MS Teams");
        let notify_error = |reason: String| Error::Notify {
            channel: CHANNEL,
            reason,
        };

        let response = self
            .client
            .post(&self.hook_url)
            .json(&card(message))
            .send()
            .map_err(|e| notify_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(notify_error(format!("HTTP {}: {}", status, body.trim())));
        }
        Ok(())
    }
}

impl Notifier for TeamsNotifier {
    fn notify_new_reviews(&self, reviews: &[ReviewRecord]) -> Result<()> {
        for review in reviews {
            self.send(&review_message(review))?;
        }
        Ok(())
    }

    fn notify_snapshot(
        &self,
        current: &RatingSnapshot,
        previous: Option<&RatingSnapshot>,
    ) -> Result<()> {
        self.send(&snapshot_message(current, previous))
    }
}

/// Legacy actionable MessageCard payload.
pub fn card(message: &Message) -> Value {
    let text: String = message
        .blocks
        .iter()
        .map(|block| match block {
            Block::Heading(text) => format!("<b>{}</b><br>", escape_html(text)),
            Block::Line(text) => format!("{}<br>", escape_html(text)),
        })
        .collect();

    json!({
        "@type": "MessageCard",
        "@context": "https://schema.org/extensions",
        "summary": message.title,
        "title": message.title,
        "sections": [{
            "activityTitle": message.subject,
            "activitySubtitle": message.subtitle,
            "text": text,
        }],
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
