use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DispatchError, Notifier};
use crate::config::MonitorConfig;
use crate::store::SettingsStore;

pub const SETTING_BOT_TOKEN: &str = "telegram_bot_token";
pub const SETTING_CHAT_ID: &str = "telegram_chat_id";

/// Credentials from config or environment, used when the settings store has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelegramDefaults {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers alerts through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    settings: Arc<dyn SettingsStore>,
    defaults: TelegramDefaults,
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        defaults: TelegramDefaults,
        client: Client,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            settings,
            defaults,
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(
        settings: Arc<dyn SettingsStore>,
        defaults: TelegramDefaults,
        config: &MonitorConfig,
    ) -> Self {
        Self::new(
            settings,
            defaults,
            Client::new(),
            config.telegram_api_base.clone(),
            config.notification_timeout,
        )
    }

    async fn credentials(&self) -> Result<(String, String), DispatchError> {
        let token = non_empty(self.settings.get_setting(SETTING_BOT_TOKEN).await?)
            .or_else(|| non_empty(self.defaults.bot_token.clone()));
        let chat_id = non_empty(self.settings.get_setting(SETTING_CHAT_ID).await?)
            .or_else(|| non_empty(self.defaults.chat_id.clone()));

        match (token, chat_id) {
            (Some(token), Some(chat_id)) => Ok((token, chat_id)),
            _ => Err(DispatchError::ConfigurationMissing),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, title: &str, body: &str) -> Result<(), DispatchError> {
        let (token, chat_id) = self.credentials().await?;
        let text = format!("{}\n\n{}", title, body);
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&SendMessage {
                chat_id: &chat_id,
                text: &text,
                parse_mode: "HTML",
            })
            .send()
            .await
            // The request URL embeds the bot token.
            .map_err(|e| DispatchError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let parsed = response.json::<ApiResponse>().await;
        match parsed {
            Ok(api) if api.ok => {
                debug!(title, "Telegram notification sent");
                Ok(())
            }
            Ok(api) => {
                let description = api
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                warn!(
                    title,
                    %status,
                    description = %description,
                    "Telegram API rejected notification"
                );
                Err(DispatchError::Rejected(description))
            }
            Err(e) => Err(DispatchError::Delivery(format!(
                "HTTP {} with unreadable body: {}",
                status.as_u16(),
                e.without_url()
            ))),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
