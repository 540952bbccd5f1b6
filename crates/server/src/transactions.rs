//! Transactions API endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{
    TransactionOutcome, TransactionStatus, TransactionVersion, TransferOutcome,
    commands::{NewTransactionCmd, TransferCmd},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct TransactionNew {
    pub account_id: String,
    pub category_id: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub status: Option<TransactionStatus>,
    pub concept_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct TransferNew {
    pub source_account_id: String,
    pub destination_account_id: String,
    pub category_id: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
}

#[derive(Deserialize)]
pub struct TransactionListQuery {
    pub account_id: Option<String>,
    pub limit: Option<u64>,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionOutcome>), ServerError> {
    let mut cmd = NewTransactionCmd::new(
        payload.account_id,
        payload.category_id,
        payload.transaction_date,
        payload.amount_minor,
    );
    if let Some(memo) = payload.memo {
        cmd = cmd.memo(memo);
    }
    if let Some(status) = payload.status {
        cmd = cmd.status(status);
    }
    if let Some(concept_id) = payload.concept_id {
        cmd = cmd.concept_id(concept_id);
    }

    let outcome = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn void_tx(
    State(state): State<ServerState>,
    Path(concept_id): Path<Uuid>,
) -> Result<Json<TransactionOutcome>, ServerError> {
    let outcome = state.engine.void_transaction(concept_id).await?;
    Ok(Json(outcome))
}

pub async fn transfer(
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferOutcome>), ServerError> {
    let mut cmd = TransferCmd::new(
        payload.source_account_id,
        payload.destination_account_id,
        payload.category_id,
        payload.transaction_date,
        payload.amount_minor,
    );
    if let Some(memo) = payload.memo {
        cmd = cmd.memo(memo);
    }

    let outcome = state.engine.transfer(cmd).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionVersion>>, ServerError> {
    let limit = query.limit.unwrap_or(50);
    let versions = state
        .engine
        .list_recent_transactions(query.account_id.as_deref(), limit)
        .await?;
    Ok(Json(versions))
}

pub async fn history(
    State(state): State<ServerState>,
    Path(concept_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionVersion>>, ServerError> {
    let versions = state.engine.concept_history(concept_id).await?;
    Ok(Json(versions))
}
