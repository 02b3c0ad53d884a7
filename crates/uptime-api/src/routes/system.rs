use axum::extract::State;
use axum::Json;
use serde::Serialize;

use uptime_core::{SchedulerState, SweepState};

use super::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub sweep_state: SweepState,
    pub interval_minutes: Option<u32>,
}

/// POST /api/v1/notifications/test
pub(super) async fn test_notification(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Err(e) = state.notifier().send_test().await {
        tracing::warn!(error = %e, "Test notification failed");
        return Err(e.into());
    }
    Ok(Json(MessageResponse {
        message: "Test notification sent successfully".into(),
    }))
}

/// GET /api/v1/scheduler
pub(super) async fn scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    let scheduler = &state.scheduler;
    Json(SchedulerStatus {
        state: scheduler.state().await,
        sweep_state: scheduler.sweep_state(),
        interval_minutes: scheduler.cadence().await.and_then(|c| c.interval_minutes()),
    })
}
