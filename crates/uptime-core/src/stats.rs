use serde::Serialize;

use crate::model::{CheckResult, TargetStatus};

/// Availability derived from a target's check history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Availability {
    pub total_checks: u64,
    pub up_checks: u64,
    /// Whole-number percentage, 0 when there is no history.
    pub uptime_percentage: u8,
    pub average_response_time: Option<u64>,
}

impl Availability {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a CheckResult>) -> Self {
        let mut total_checks = 0u64;
        let mut up_checks = 0u64;
        let mut latency_sum = 0u64;
        let mut latency_count = 0u64;

        for r in results {
            total_checks += 1;
            if r.status == TargetStatus::Up {
                up_checks += 1;
            }
            if let Some(ms) = r.response_time {
                latency_sum = latency_sum.saturating_add(ms);
                latency_count += 1;
            }
        }

        Self {
            total_checks,
            up_checks,
            uptime_percentage: percentage(up_checks, total_checks),
            average_response_time: (latency_count > 0).then(|| latency_sum / latency_count),
        }
    }

    /// Fraction in `0.0..=1.0`, as exported by the metrics endpoint.
    pub fn uptime_ratio(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.up_checks as f64 / self.total_checks as f64
        }
    }
}

fn percentage(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u8
}
