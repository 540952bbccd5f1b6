//! Budget allocation API endpoints.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{Allocation, CategoryMonthState, commands::AllocationCmd};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct AllocationNew {
    pub to_category_id: String,
    pub from_category_id: Option<String>,
    pub allocation_date: NaiveDate,
    pub month_start: Option<NaiveDate>,
    pub amount_minor: i64,
    pub memo: Option<String>,
}

#[derive(Deserialize)]
pub struct AllocationListQuery {
    pub month: NaiveDate,
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct ReadyToAssignQuery {
    pub month: NaiveDate,
}

#[derive(Serialize)]
pub struct ReadyToAssignResponse {
    pub month_start: NaiveDate,
    pub ready_to_assign_minor: i64,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AllocationNew>,
) -> Result<(StatusCode, Json<CategoryMonthState>), ServerError> {
    let mut cmd = AllocationCmd::new(
        payload.to_category_id,
        payload.allocation_date,
        payload.amount_minor,
    );
    if let Some(from_category_id) = payload.from_category_id {
        cmd = cmd.from_category_id(from_category_id);
    }
    if let Some(month_start) = payload.month_start {
        cmd = cmd.month_start(month_start);
    }
    if let Some(memo) = payload.memo {
        cmd = cmd.memo(memo);
    }

    let state_after = state.engine.allocate(cmd).await?;
    Ok((StatusCode::CREATED, Json(state_after)))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AllocationListQuery>,
) -> Result<Json<Vec<Allocation>>, ServerError> {
    let limit = query.limit.unwrap_or(50);
    let allocations = state.engine.list_allocations(query.month, limit).await?;
    Ok(Json(allocations))
}

pub async fn ready_to_assign(
    State(state): State<ServerState>,
    Query(query): Query<ReadyToAssignQuery>,
) -> Result<Json<ReadyToAssignResponse>, ServerError> {
    let month_start = engine::month::month_start(query.month);
    let ready_to_assign_minor = state.engine.ready_to_assign(month_start).await?;
    Ok(Json(ReadyToAssignResponse {
        month_start,
        ready_to_assign_minor,
    }))
}
