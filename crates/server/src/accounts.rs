//! Accounts API endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{
    Account, AccountClass, AccountRole, AccountType,
    commands::{NewAccountCmd, UpdateAccountCmd},
};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};

#[derive(Deserialize)]
pub struct AccountNew {
    pub account_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_class: AccountClass,
    pub account_role: Option<AccountRole>,
    pub currency: Option<String>,
    pub opened_on: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_role: Option<AccountRole>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct AccountListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    let mut cmd = NewAccountCmd::new(
        payload.account_id,
        payload.name,
        payload.account_type,
        payload.account_class,
    );
    if let Some(role) = payload.account_role {
        cmd = cmd.account_role(role);
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(currency);
    }
    if let Some(opened_on) = payload.opened_on {
        cmd = cmd.opened_on(opened_on);
    }

    let account = state.engine.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<Account>, ServerError> {
    let mut cmd = UpdateAccountCmd::default();
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(role) = payload.account_role {
        cmd = cmd.account_role(role);
    }
    if let Some(is_active) = payload.is_active {
        cmd = cmd.is_active(is_active);
    }

    let account = state.engine.update_account(&account_id, cmd).await?;
    Ok(Json(account))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(account_id): Path<String>,
) -> Result<Json<Account>, ServerError> {
    let account = state.engine.get_account(&account_id).await?;
    Ok(Json(account))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<Vec<Account>>, ServerError> {
    let accounts = state.engine.list_accounts(query.include_inactive).await?;
    Ok(Json(accounts))
}
