//! Alert delivery.
//!
//! The checker calls a [`Notifier`] inline, after the check result has been
//! recorded, so a failed delivery can never undo or block the check itself.

mod telegram;

pub use telegram::{TelegramDefaults, TelegramNotifier, SETTING_BOT_TOKEN, SETTING_CHAT_ID};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::Target;
use crate::store::StoreError;

pub const DOWN_ALERT_TITLE: &str = "🚨 Domain Down Alert";
pub const TEST_TITLE: &str = "Test Notification";
pub const TEST_BODY: &str = "This is a test message from your Domain Monitor application.";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Telegram bot token or chat ID not configured")]
    ConfigurationMissing,
    #[error("failed to read notification settings: {0}")]
    Settings(#[from] StoreError),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("Telegram API error: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> Result<(), DispatchError>;

    /// Explicit "test notification" action. Errors are meant for the caller.
    async fn send_test(&self) -> Result<(), DispatchError> {
        self.send(TEST_TITLE, TEST_BODY).await
    }
}

/// Body of the alert sent when a target goes from up to down. Dynamic fields
/// are escaped for Telegram's HTML parse mode.
pub fn down_alert_body(target: &Target, error: Option<&str>, at: DateTime<Utc>) -> String {
    format!(
        "Domain: {}\nURL: {}\nStatus: DOWN\nError: {}\nTime: {}",
        escape_html(&target.name),
        escape_html(&target.url),
        escape_html(error.unwrap_or("unknown")),
        at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn down_alert_lists_target_details() {
        let target = Target::new(1, "shop", "https://shop.example/?a=1&b=2");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let body = down_alert_body(&target, Some("HTTP 502: Bad Gateway"), at);
        assert_eq!(
            body,
            "Domain: shop\nURL: https://shop.example/?a=1&amp;b=2\nStatus: DOWN\n\
             Error: HTTP 502: Bad Gateway\nTime: 2024-05-01 12:30:00 UTC"
        );
    }

    #[test]
    fn escape_html_handles_markup() {
        assert_eq!(escape_html("<b>x</b> & y"), "&lt;b&gt;x&lt;/b&gt; &amp; y");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn configuration_missing_message() {
        assert_eq!(
            DispatchError::ConfigurationMissing.to_string(),
            "Telegram bot token or chat ID not configured"
        );
    }
}
