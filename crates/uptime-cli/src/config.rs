//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [monitor]
//! check_interval_minutes = 5
//! probe_timeout_ms = 10000
//!
//! [telegram]
//! bot_token = "123456:ABC"
//! chat_id = "-100200300"
//!
//! [settings]
//! telegram_chat_id = "-100999"
//!
//! [[group]]
//! id = 1
//! name = "storefront"
//!
//! [[target]]
//! id = 1
//! name = "shop"
//! url = "https://shop.example.com"
//! group_id = 1
//! ```
//!
//! `CHECK_INTERVAL_MINUTES`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`
//! override the file when set.

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use uptime_core::config::DEFAULT_CHECK_INTERVAL_MINUTES;
use uptime_core::model::{GroupId, TargetId};
use uptime_core::{Group, MemoryStore, MonitorConfig, Target, TelegramDefaults};

const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL_MINUTES";
const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub telegram: TelegramSection,

    /// Seed values for the settings store.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,

    #[serde(default)]
    pub group: Vec<GroupDef>,

    #[serde(default)]
    pub target: Vec<TargetDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_check_interval")]
    pub check_interval_minutes: u32,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    #[serde(default)]
    pub notification_timeout_ms: Option<u64>,

    #[serde(default)]
    pub sweep_timeout_ms: Option<u64>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            check_interval_minutes: default_check_interval(),
            probe_timeout_ms: default_probe_timeout_ms(),
            connect_timeout_ms: None,
            notification_timeout_ms: None,
            sweep_timeout_ms: None,
        }
    }
}

fn default_check_interval() -> u32 {
    DEFAULT_CHECK_INTERVAL_MINUTES
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDef {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetDef {
    pub id: TargetId,
    pub name: String,
    pub url: String,
    pub group_id: Option<GroupId>,
}

impl AppConfig {
    /// Reads, applies environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> Result<Self, String> {
        let mut config = AppConfig::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), String> {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = set(ENV_CHECK_INTERVAL) {
            self.monitor.check_interval_minutes = raw.trim().parse().map_err(|_| {
                format!("Invalid {}: '{}' is not a whole number", ENV_CHECK_INTERVAL, raw)
            })?;
        }
        if let Some(token) = set(ENV_BOT_TOKEN) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = set(ENV_CHAT_ID) {
            self.telegram.chat_id = Some(chat_id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        let interval = self.monitor.check_interval_minutes;
        if !(1..=59).contains(&interval) {
            return Err(format!(
                "Invalid check_interval_minutes {}: must be between 1 and 59",
                interval
            ));
        }
        if self.monitor.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms must be greater than zero".into());
        }

        if let Some(base) = &self.telegram.api_base {
            url::Url::parse(base)
                .map_err(|e| format!("Invalid telegram api_base: {} ({})", base, e))?;
        }

        let mut group_ids = HashSet::new();
        for g in &self.group {
            if !group_ids.insert(g.id) {
                return Err(format!("Duplicate group ID: {}", g.id));
            }
        }

        let mut target_ids = HashSet::new();
        for t in &self.target {
            if !target_ids.insert(t.id) {
                return Err(format!("Duplicate target ID: {}", t.id));
            }
            if t.name.trim().is_empty() {
                return Err(format!("Target {} has an empty name", t.id));
            }
            let parsed = url::Url::parse(&t.url)
                .map_err(|e| format!("Invalid URL for target {}: {} ({})", t.id, t.url, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "Target URL must use http or https for target {}: {}",
                    t.id, t.url
                ));
            }
            if let Some(gid) = t.group_id {
                if !group_ids.contains(&gid) {
                    return Err(format!("Target {} references unknown group {}", t.id, gid));
                }
            }
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }

    pub fn to_monitor_config(&self) -> MonitorConfig {
        let m = &self.monitor;
        let mut c = MonitorConfig::default()
            .with_check_interval_minutes(m.check_interval_minutes)
            .with_probe_timeout(m.probe_timeout_ms)
            .with_sweep_timeout(m.sweep_timeout_ms);
        if let Some(ms) = m.connect_timeout_ms {
            c = c.with_connect_timeout(ms);
        }
        if let Some(ms) = m.notification_timeout_ms {
            c = c.with_notification_timeout(ms);
        }
        if let Some(base) = &self.telegram.api_base {
            c = c.with_telegram_api_base(base.clone());
        }
        c
    }

    pub fn telegram_defaults(&self) -> TelegramDefaults {
        TelegramDefaults {
            bot_token: self.telegram.bot_token.clone(),
            chat_id: self.telegram.chat_id.clone(),
        }
    }

    /// Loads groups, targets and settings into the store.
    pub fn seed(&self, store: &MemoryStore) {
        for g in &self.group {
            store.insert_group(Group {
                id: g.id,
                name: g.name.clone(),
                description: g.description.clone(),
            });
        }
        for t in &self.target {
            let mut target = Target::new(t.id, t.name.clone(), t.url.clone());
            if let Some(gid) = t.group_id {
                target = target.with_group(gid);
            }
            store.insert_target(target);
        }
        for (key, value) in &self.settings {
            store.set_setting(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use uptime_core::{SettingsStore, TargetStore};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[[target]]
id = 1
name = "shop"
url = "https://shop.example.com"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.target.len(), 1);
        assert_eq!(config.monitor.check_interval_minutes, 5);
        assert_eq!(config.monitor.probe_timeout_ms, 10_000);
        assert_eq!(config.server.log_format, "pretty");
        assert_eq!(config.server.listen.port(), 8080);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[server]
listen = "127.0.0.1:9090"
log_format = "json"

[monitor]
check_interval_minutes = 10
probe_timeout_ms = 4000
connect_timeout_ms = 8000
sweep_timeout_ms = 120000

[telegram]
bot_token = "123:file"
chat_id = "77"
api_base = "http://localhost:8081/"

[settings]
telegram_chat_id = "88"

[[group]]
id = 1
name = "storefront"
description = "Customer facing"

[[target]]
id = 1
name = "shop"
url = "https://shop.example.com"
group_id = 1

[[target]]
id = 2
name = "blog"
url = "http://blog.example.com"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.listen.port(), 9090);
        assert_eq!(config.server.log_format, "json");

        let mc = config.to_monitor_config();
        assert_eq!(mc.check_interval_minutes, 10);
        assert_eq!(mc.probe_timeout, Duration::from_millis(4000));
        // Connect timeout never exceeds the probe bound.
        assert_eq!(mc.connect_timeout, Duration::from_millis(4000));
        assert_eq!(mc.sweep_timeout, Some(Duration::from_secs(120)));
        assert_eq!(mc.telegram_api_base, "http://localhost:8081");

        let defaults = config.telegram_defaults();
        assert_eq!(defaults.bot_token.as_deref(), Some("123:file"));
        assert_eq!(defaults.chat_id.as_deref(), Some("77"));
    }

    #[tokio::test]
    async fn seed_fills_store() {
        let toml = r#"
[settings]
telegram_bot_token = "abc"

[[group]]
id = 3
name = "api"

[[target]]
id = 9
name = "api"
url = "https://api.example.com"
group_id = 3
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let store = MemoryStore::new();
        config.seed(&store);

        let target = store.get_target(9).await.unwrap().unwrap();
        assert_eq!(target.group_id, Some(3));
        assert_eq!(store.group(3).unwrap().name, "api");
        assert_eq!(
            store.get_setting("telegram_bot_token").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn env_overrides_file() {
        let toml = r#"
[monitor]
check_interval_minutes = 10

[telegram]
bot_token = "file-token"
chat_id = "file-chat"
"#;
        let mut config: AppConfig = toml::from_str(toml).unwrap();
        config
            .apply_env(env(&[
                ("CHECK_INTERVAL_MINUTES", "15"),
                ("TELEGRAM_BOT_TOKEN", "env-token"),
                ("TELEGRAM_CHAT_ID", "  "),
            ]))
            .unwrap();

        assert_eq!(config.monitor.check_interval_minutes, 15);
        assert_eq!(config.telegram.bot_token.as_deref(), Some("env-token"));
        // Blank env values are ignored.
        assert_eq!(config.telegram.chat_id.as_deref(), Some("file-chat"));
    }

    #[test]
    fn env_interval_must_be_numeric() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("CHECK_INTERVAL_MINUTES", "five")]))
            .unwrap_err();
        assert!(err.contains("CHECK_INTERVAL_MINUTES"), "{}", err);
    }

    #[test]
    fn validate_rejects_interval_out_of_range() {
        for bad in ["0", "60"] {
            let toml = format!("[monitor]\ncheck_interval_minutes = {}\n", bad);
            let config: AppConfig = toml::from_str(&toml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.contains("check_interval_minutes"), "{}", err);
        }
    }

    #[test]
    fn validate_rejects_duplicate_target_ids() {
        let toml = r#"
[[target]]
id = 1
name = "a"
url = "https://a.example.com"

[[target]]
id = 1
name = "b"
url = "https://b.example.com"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Duplicate target ID"), "{}", err);
    }

    #[test]
    fn validate_rejects_non_http_url() {
        let toml = r#"
[[target]]
id = 1
name = "ftp"
url = "ftp://files.example.com"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("must use http or https"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_url() {
        let toml = r#"
[[target]]
id = 1
name = "bad"
url = "not-a-url"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid URL"), "{}", err);
    }

    #[test]
    fn validate_rejects_unknown_group() {
        let toml = r#"
[[target]]
id = 1
name = "orphan"
url = "https://orphan.example.com"
group_id = 4
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("unknown group 4"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let toml = r#"
[server]
log_format = "xml"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_format"), "{}", err);
    }
}
