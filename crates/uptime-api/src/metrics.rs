use std::fmt::{self, Write};

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use uptime_core::{Availability, SweepState, Target, TargetStatus};

use crate::error::ApiError;
use crate::state::AppState;

const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

struct TargetMetrics {
    target: Target,
    availability: Availability,
}

pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store();
    let mut targets = Vec::new();
    for target in store.list_targets().await? {
        let availability = store.availability(target.id).await?;
        targets.push(TargetMetrics { target, availability });
    }

    let scheduler_state = state.scheduler.state().await.to_string();
    let sweep_running = state.scheduler.sweep_state() == SweepState::Running;

    let body = render(&targets, &scheduler_state, sweep_running)
        .map_err(|e| ApiError::Internal(format!("failed to render metrics: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}

fn render(
    targets: &[TargetMetrics],
    scheduler_state: &str,
    sweep_running: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(4096);

    writeln!(out, "# TYPE uptime_monitor_scheduler_state stateset")?;
    writeln!(out, "# HELP uptime_monitor_scheduler_state Lifecycle state of the sweep scheduler")?;
    for variant in ["idle", "active", "stopping", "stopped"] {
        writeln!(
            out,
            "uptime_monitor_scheduler_state{{uptime_monitor_scheduler_state=\"{}\"}} {}",
            variant,
            u8::from(scheduler_state == variant)
        )?;
    }

    writeln!(out, "# TYPE uptime_monitor_sweep_running gauge")?;
    writeln!(out, "# HELP uptime_monitor_sweep_running Whether a sweep is in flight")?;
    writeln!(out, "uptime_monitor_sweep_running {}", u8::from(sweep_running))?;

    writeln!(out, "# TYPE uptime_monitor_target_up gauge")?;
    writeln!(out, "# HELP uptime_monitor_target_up Whether the last check found the target up")?;
    for m in targets {
        if m.target.status == TargetStatus::Unknown {
            continue;
        }
        writeln!(
            out,
            "uptime_monitor_target_up{{{}}} {}",
            labels(&m.target),
            u8::from(m.target.status == TargetStatus::Up)
        )?;
    }

    writeln!(out, "# TYPE uptime_monitor_response_time_seconds gauge")?;
    writeln!(out, "# HELP uptime_monitor_response_time_seconds Latency of the last check")?;
    for m in targets {
        if let Some(ms) = m.target.response_time {
            writeln!(
                out,
                "uptime_monitor_response_time_seconds{{{}}} {:.3}",
                labels(&m.target),
                ms as f64 / 1000.0
            )?;
        }
    }

    writeln!(out, "# TYPE uptime_monitor_uptime_ratio gauge")?;
    writeln!(out, "# HELP uptime_monitor_uptime_ratio Share of recorded checks that were up")?;
    for m in targets {
        writeln!(
            out,
            "uptime_monitor_uptime_ratio{{{}}} {:.4}",
            labels(&m.target),
            m.availability.uptime_ratio()
        )?;
    }

    writeln!(out, "# TYPE uptime_monitor_checks counter")?;
    writeln!(out, "# HELP uptime_monitor_checks Recorded checks per target")?;
    for m in targets {
        writeln!(
            out,
            "uptime_monitor_checks_total{{{}}} {}",
            labels(&m.target),
            m.availability.total_checks
        )?;
    }

    writeln!(out, "# TYPE uptime_monitor_last_check_timestamp_seconds gauge")?;
    writeln!(
        out,
        "# HELP uptime_monitor_last_check_timestamp_seconds Unix timestamp of the last check"
    )?;
    for m in targets {
        if let Some(t) = m.target.last_checked {
            let secs = t.timestamp() as f64 + (t.timestamp_subsec_millis() as f64 / 1000.0);
            writeln!(
                out,
                "uptime_monitor_last_check_timestamp_seconds{{{}}} {:.3}",
                labels(&m.target),
                secs
            )?;
        }
    }

    writeln!(out, "# EOF")?;
    Ok(out)
}

fn labels(target: &Target) -> String {
    format!(
        "target_id=\"{}\",target_name=\"{}\"",
        target.id,
        escape_label(&target.name)
    )
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
