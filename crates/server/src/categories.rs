//! Categories API endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use engine::{
    Category, CategoryGoal, CategoryGroup, CategoryMonthDetail,
    commands::{NewCategoryCmd, NewGroupCmd, UpdateCategoryCmd},
};
use serde::{Deserialize, Deserializer};

use crate::{ServerError, server::ServerState};

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct CategoryNew {
    pub category_id: String,
    pub name: String,
    pub group_id: Option<String>,
    pub goal: Option<CategoryGoal>,
}

#[derive(Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    /// Present means "set the group to this value", where `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub group_id: Option<Option<String>>,
    /// Same convention as `group_id`: `null` removes the goal.
    #[serde(default, deserialize_with = "double_option")]
    pub goal: Option<Option<CategoryGoal>>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct GroupNew {
    pub group_id: String,
    pub name: String,
    pub sort_order: Option<i32>,
}

#[derive(Deserialize)]
pub struct CategoryListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Deserialize)]
pub struct MonthQuery {
    pub month: NaiveDate,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<Category>), ServerError> {
    let mut cmd = NewCategoryCmd::new(payload.category_id, payload.name);
    if let Some(group_id) = payload.group_id {
        cmd = cmd.group_id(group_id);
    }
    if let Some(goal) = payload.goal {
        cmd = cmd.goal(goal);
    }
    let category = state.engine.create_category(cmd).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(category_id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<Category>, ServerError> {
    let mut cmd = UpdateCategoryCmd::default();
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(group_id) = payload.group_id {
        cmd = cmd.group_id(group_id);
    }
    if let Some(goal) = payload.goal {
        cmd = cmd.goal(goal);
    }
    if let Some(is_active) = payload.is_active {
        cmd = cmd.is_active(is_active);
    }
    let category = state.engine.update_category(&category_id, cmd).await?;
    Ok(Json(category))
}

pub async fn get_one(
    State(state): State<ServerState>,
    Path(category_id): Path<String>,
) -> Result<Json<Category>, ServerError> {
    let category = state.engine.get_category(&category_id).await?;
    Ok(Json(category))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<Category>>, ServerError> {
    let categories = state.engine.list_categories(query.include_inactive).await?;
    Ok(Json(categories))
}

pub async fn create_group(
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<CategoryGroup>), ServerError> {
    let mut cmd = NewGroupCmd::new(payload.group_id, payload.name);
    if let Some(sort_order) = payload.sort_order {
        cmd = cmd.sort_order(sort_order);
    }
    let group = state.engine.create_group(cmd).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn list_groups(
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryGroup>>, ServerError> {
    let groups = state.engine.list_groups().await?;
    Ok(Json(groups))
}

pub async fn month_overview(
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryMonthDetail>>, ServerError> {
    let details = state.engine.month_overview(query.month).await?;
    Ok(Json(details))
}
