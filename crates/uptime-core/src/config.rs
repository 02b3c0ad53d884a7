use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHECK_INTERVAL_MINUTES: u32 = 5;
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub check_interval_minutes: u32,
    /// Upper bound on a single probe, from request start to response headers (default: 10s).
    pub probe_timeout: Duration,
    /// TCP/TLS connect timeout for probes. Never longer than `probe_timeout`.
    pub connect_timeout: Duration,
    pub notification_timeout: Duration,
    pub telegram_api_base: String,
    /// Optional bound on a whole sweep. Unfinished checks are aborted when it expires.
    pub sweep_timeout: Option<Duration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            probe_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            notification_timeout: Duration::from_secs(10),
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            sweep_timeout: None,
        }
    }
}

impl MonitorConfig {
    pub fn with_check_interval_minutes(mut self, minutes: u32) -> Self {
        self.check_interval_minutes = minutes;
        self
    }

    pub fn with_probe_timeout(mut self, ms: u64) -> Self {
        self.probe_timeout = Duration::from_millis(ms);
        if self.connect_timeout > self.probe_timeout {
            self.connect_timeout = self.probe_timeout;
        }
        self
    }

    pub fn with_connect_timeout(mut self, ms: u64) -> Self {
        self.connect_timeout = Duration::from_millis(ms).min(self.probe_timeout);
        self
    }

    pub fn with_notification_timeout(mut self, ms: u64) -> Self {
        self.notification_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_telegram_api_base(mut self, base: impl Into<String>) -> Self {
        self.telegram_api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_sweep_timeout(mut self, ms: Option<u64>) -> Self {
        self.sweep_timeout = ms.map(Duration::from_millis);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = MonitorConfig::default();
        assert_eq!(c.check_interval_minutes, 5);
        assert_eq!(c.probe_timeout, Duration::from_secs(10));
        assert_eq!(c.telegram_api_base, "https://api.telegram.org");
        assert!(c.sweep_timeout.is_none());
    }

    #[test]
    fn short_probe_timeout_clamps_connect_timeout() {
        let c = MonitorConfig::default().with_probe_timeout(1500);
        assert_eq!(c.connect_timeout, Duration::from_millis(1500));

        let c = c.with_connect_timeout(60_000);
        assert_eq!(c.connect_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let c = MonitorConfig::default().with_telegram_api_base("http://127.0.0.1:9000/");
        assert_eq!(c.telegram_api_base, "http://127.0.0.1:9000");
    }
}
