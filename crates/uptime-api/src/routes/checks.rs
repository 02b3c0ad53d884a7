use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use uptime_core::{CheckResult, GroupCheckSummary, SweepSummary};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GroupCheckResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: GroupCheckSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckAllResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: SweepSummary,
}

/// POST /api/v1/targets/:id/check
pub(super) async fn check_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CheckResult>, ApiError> {
    let id = parse_id("target", &id)?;
    Ok(Json(state.checker.check_one(id).await?))
}

/// POST /api/v1/groups/:id/check
pub(super) async fn check_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GroupCheckResponse>, ApiError> {
    let id = parse_id("group", &id)?;
    let summary = state.checker.check_group(id).await?;

    let message = if summary.total == 0 {
        "No targets in this group to check".to_string()
    } else {
        format!(
            "Checked {}/{} targets in this group",
            summary.completed_count, summary.total
        )
    };
    Ok(Json(GroupCheckResponse { message, summary }))
}

/// POST /api/v1/checks
pub(super) async fn check_all(
    State(state): State<AppState>,
) -> Result<Json<CheckAllResponse>, ApiError> {
    let summary = state.checker.check_all_now().await?;
    Ok(Json(CheckAllResponse {
        message: format!(
            "Completed {}/{} target checks",
            summary.successful, summary.total
        ),
        summary,
    }))
}
