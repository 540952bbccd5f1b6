//! Reconciliation API endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{
    ReconciliationCheckpoint, WorksheetEntry, commands::CheckpointCmd,
};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct CheckpointNew {
    pub statement_date: NaiveDate,
    pub statement_balance_minor: i64,
    pub statement_pending_total_minor: Option<i64>,
}

pub async fn create(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<CheckpointNew>,
) -> Result<(StatusCode, Json<ReconciliationCheckpoint>), ServerError> {
    let mut cmd = CheckpointCmd::new(
        account_id,
        payload.statement_date,
        payload.statement_balance_minor,
    );
    if let Some(total) = payload.statement_pending_total_minor {
        cmd = cmd.statement_pending_total_minor(total);
    }

    let checkpoint = state.engine.create_checkpoint(cmd).await?;
    Ok((StatusCode::CREATED, Json(checkpoint)))
}

pub async fn latest(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Option<ReconciliationCheckpoint>>, ServerError> {
    let checkpoint = state.engine.latest_checkpoint(&account_id).await?;
    Ok(Json(checkpoint))
}

pub async fn worksheet(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<WorksheetEntry>>, ServerError> {
    let entries = state.engine.reconciliation_worksheet(&account_id).await?;
    Ok(Json(entries))
}
