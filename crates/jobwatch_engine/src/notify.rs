use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::{format_notification, JobPosting};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use watch_logging::{watch_info, watch_warn};

use crate::NotifyError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Outbound messaging channel: send text, learn success or failure.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API `sendMessage` in legacy Markdown with link previews off.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramTransport {
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Points the transport at another Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

#[async_trait::async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            // The URL embeds the bot token.
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Sends one message per posting. A failed send is logged and skipped; the
/// posting is never retried.
pub struct NotificationDispatcher {
    transport: Arc<dyn Transport>,
    delay_between: Duration,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn Transport>, delay_between: Duration) -> Self {
        Self {
            transport,
            delay_between,
        }
    }

    pub async fn notify(&self, posting: &JobPosting) -> Result<(), NotifyError> {
        self.transport.send(&format_notification(posting)).await
    }

    pub async fn dispatch(&self, postings: &[JobPosting]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for (index, posting) in postings.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay_between).await;
            }
            match self.notify(posting).await {
                Ok(()) => {
                    summary.sent += 1;
                    watch_info!("notified: {} ({})", posting.title, posting.company);
                }
                Err(err) => {
                    summary.failed += 1;
                    watch_warn!("notification failed for {}: {}", posting.url, err);
                }
            }
        }
        summary
    }
}
