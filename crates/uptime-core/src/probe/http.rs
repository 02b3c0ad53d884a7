use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::Client;
use tokio::time::Instant;
use tracing::debug;

use super::{ProbeError, ProbeOutcome, Prober};
use crate::config::MonitorConfig;
use crate::model::Target;

const USER_AGENT: &str = concat!("uptime-monitor/", env!("CARGO_PKG_VERSION"));

/// Resolver failures surface from hyper-util as a `ConnectError("dns error", ..)`
/// wrapping the platform's getaddrinfo message.
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
];

/// reqwest-based prober. A single GET per check, redirects followed, bounded
/// by the configured probe timeout.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            client: Self::build_client(timeout, connect_timeout),
            timeout,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.probe_timeout, config.connect_timeout)
    }

    pub fn build_client(timeout: Duration, connect_timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout.min(timeout))
            .pool_max_idle_per_host(4)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target) -> ProbeOutcome {
        let started = Instant::now();
        let sent = tokio::time::timeout(self.timeout, self.client.get(&target.url).send()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = match sent {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.as_u16() < 400 {
                    ProbeOutcome::up(elapsed_ms)
                } else {
                    let reason = reason_phrase(&response);
                    ProbeOutcome::down(
                        ProbeError::Http {
                            code: status.as_u16(),
                            reason,
                        },
                        Some(elapsed_ms),
                    )
                }
            }
            Ok(Err(e)) => ProbeOutcome::down(classify_error(&e), Some(elapsed_ms)),
            Err(_) => ProbeOutcome::down(ProbeError::Timeout, Some(elapsed_ms)),
        };

        debug!(
            target_id = target.id,
            url = %target.url,
            status = %outcome.status,
            latency_ms = elapsed_ms,
            error = outcome.error_message().as_deref().unwrap_or(""),
            "Probe finished"
        );
        outcome
    }
}

/// The server's own phrase when it sent a non-canonical one.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string(),
    }
}

fn classify_error(e: &reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        return ProbeError::Timeout;
    }
    let chain = error_chain(e);
    let lowered = chain.to_lowercase();
    if DNS_MARKERS.iter().any(|m| lowered.contains(m)) {
        return ProbeError::DnsFailure;
    }
    ProbeError::Transport(chain)
}

/// Joins an error and its sources with `": "`, skipping sources whose text is
/// already contained in the previous link.
fn error_chain(e: &(dyn StdError + 'static)) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        let text = s.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = s.source();
    }
    out
}
