use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use uptime_core::{Availability, CheckResult, Target};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;
pub const MAX_HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    #[serde(flatten)]
    pub target: Target,
    pub group_name: Option<String>,
    #[serde(flatten)]
    pub availability: Availability,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/targets
pub(super) async fn list_targets(
    State(state): State<AppState>,
) -> Result<Json<Vec<TargetSummary>>, ApiError> {
    let store = state.store();
    let group_names: HashMap<_, _> = store
        .list_groups()
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    let mut summaries = Vec::new();
    for target in store.list_targets().await? {
        let availability = store.availability(target.id).await?;
        summaries.push(TargetSummary {
            group_name: target
                .group_id
                .and_then(|gid| group_names.get(&gid).cloned()),
            availability,
            target,
        });
    }
    Ok(Json(summaries))
}

/// GET /api/v1/targets/:id
pub(super) async fn get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Target>, ApiError> {
    let id = parse_id("target", &id)?;
    state
        .store()
        .get_target(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("target {} not found", id)))
}

/// GET /api/v1/targets/:id/history
pub(super) async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<CheckResult>>, ApiError> {
    let id = parse_id("target", &id)?;
    let limit = match query.limit {
        Some(0) => return Err(ApiError::BadRequest("limit must be positive".into())),
        Some(n) => n.min(MAX_HISTORY_LIMIT),
        None => DEFAULT_HISTORY_LIMIT,
    };

    let store = state.store();
    if store.get_target(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("target {} not found", id)));
    }
    Ok(Json(store.recent_results(id, limit).await?))
}
