//! `/api/v1` routes. Read-only views plus the on-demand check triggers; target
//! and group CRUD lives elsewhere.

mod checks;
mod system;
mod targets;

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub use checks::{CheckAllResponse, GroupCheckResponse};
pub use system::SchedulerStatus;
pub use targets::{HistoryQuery, TargetSummary, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/targets", get(targets::list_targets))
        .route("/targets/{id}", get(targets::get_target))
        .route("/targets/{id}/history", get(targets::get_history))
        .route("/targets/{id}/check", post(checks::check_target))
        .route("/groups/{id}/check", post(checks::check_group))
        .route("/checks", post(checks::check_all))
        .route("/notifications/test", post(system::test_notification))
        .route("/scheduler", get(system::scheduler_status))
}

fn parse_id(kind: &str, id: &str) -> Result<i64, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID: {}", kind, id)))
}
