//! Category and group administration, plus month reporting.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;
use tracing::info;

use crate::{
    Category, CategoryGroup, CategoryMonthState, EngineError, ResultEngine, categories,
    category_groups,
    commands::{NewCategoryCmd, NewGroupCmd, UpdateCategoryCmd},
    month::month_start,
    monthly_state,
    ops::{Engine, PAYMENT_CATEGORY_PREFIX, normalize_required_name, with_tx},
};

/// Rollover-aware envelope view for one category in one month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryMonthDetail {
    pub category: Category,
    pub state: CategoryMonthState,
}

impl Engine {
    /// Register a new category group.
    pub async fn create_group(&self, cmd: NewGroupCmd) -> ResultEngine<CategoryGroup> {
        let name = normalize_required_name(&cmd.name, "group")?;
        let now = self.clock.now();
        with_tx!(self, |tx| {
            async {
                if category_groups::Entity::find_by_id(&cmd.group_id)
                    .one(&tx)
                    .await?
                    .is_some()
                {
                    return Err(EngineError::AlreadyExists(format!(
                        "Group `{}`",
                        cmd.group_id
                    )));
                }
                let model = category_groups::ActiveModel {
                    group_id: ActiveValue::Set(cmd.group_id.clone()),
                    name: ActiveValue::Set(name),
                    sort_order: ActiveValue::Set(cmd.sort_order),
                    is_active: ActiveValue::Set(true),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                };
                let inserted = category_groups::Entity::insert(model)
                    .exec_with_returning(&tx)
                    .await?;
                info!(group_id = %inserted.group_id, "category group created");
                Ok(CategoryGroup::from(inserted))
            }
            .await
        })
    }

    pub async fn list_groups(&self) -> ResultEngine<Vec<CategoryGroup>> {
        Ok(category_groups::Entity::find()
            .filter(category_groups::Column::IsActive.eq(true))
            .order_by_asc(category_groups::Column::SortOrder)
            .order_by_asc(category_groups::Column::GroupId)
            .all(&self.database)
            .await?
            .into_iter()
            .map(CategoryGroup::from)
            .collect())
    }

    /// Register a new budget category.
    ///
    /// Ids under the payment prefix are reserved for auto-provisioned credit
    /// payment envelopes.
    pub async fn create_category(&self, cmd: NewCategoryCmd) -> ResultEngine<Category> {
        if cmd.category_id.starts_with(PAYMENT_CATEGORY_PREFIX) {
            return Err(EngineError::InvalidTransaction(format!(
                "Category ids with the `{PAYMENT_CATEGORY_PREFIX}` prefix are reserved."
            )));
        }
        let name = normalize_required_name(&cmd.name, "category")?;
        let now = self.clock.now();

        with_tx!(self, |tx| {
            async {
                if categories::Entity::find_by_id(&cmd.category_id)
                    .one(&tx)
                    .await?
                    .is_some()
                {
                    return Err(EngineError::AlreadyExists(format!(
                        "Category `{}`",
                        cmd.category_id
                    )));
                }
                if let Some(group_id) = cmd.group_id.as_deref()
                    && category_groups::Entity::find_by_id(group_id)
                        .one(&tx)
                        .await?
                        .is_none()
                {
                    return Err(EngineError::GroupNotFound(group_id.to_string()));
                }

                let goal = cmd.goal.clone();
                let model = categories::ActiveModel {
                    category_id: ActiveValue::Set(cmd.category_id.clone()),
                    group_id: ActiveValue::Set(cmd.group_id.clone()),
                    name: ActiveValue::Set(name),
                    is_active: ActiveValue::Set(true),
                    is_system: ActiveValue::Set(false),
                    goal_type: ActiveValue::Set(goal.as_ref().map(|g| g.goal_type.clone())),
                    goal_amount_minor: ActiveValue::Set(
                        goal.as_ref().and_then(|g| g.amount_minor),
                    ),
                    goal_target_date: ActiveValue::Set(goal.as_ref().and_then(|g| g.target_date)),
                    goal_frequency: ActiveValue::Set(goal.and_then(|g| g.frequency)),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                };
                let inserted = categories::Entity::insert(model)
                    .exec_with_returning(&tx)
                    .await?;
                info!(category_id = %inserted.category_id, "category created");
                Category::try_from(inserted)
            }
            .await
        })
    }

    /// Apply a partial update to a category. System categories are fixed.
    pub async fn update_category(
        &self,
        category_id: &str,
        cmd: UpdateCategoryCmd,
    ) -> ResultEngine<Category> {
        let now = self.clock.now();
        with_tx!(self, |tx| {
            async {
                let model = categories::Entity::find_by_id(category_id)
                    .one(&tx)
                    .await?
                    .ok_or_else(|| EngineError::CategoryNotFound(category_id.to_string()))?;
                if model.is_system {
                    return Err(EngineError::InvalidTransaction(
                        "System categories cannot be modified.".to_string(),
                    ));
                }
                let mut active: categories::ActiveModel = model.into();
                if let Some(name) = cmd.name.as_deref() {
                    active.name = ActiveValue::Set(normalize_required_name(name, "category")?);
                }
                if let Some(group_id) = cmd.group_id.clone() {
                    if let Some(group_id) = group_id.as_deref()
                        && category_groups::Entity::find_by_id(group_id)
                            .one(&tx)
                            .await?
                            .is_none()
                    {
                        return Err(EngineError::GroupNotFound(group_id.to_string()));
                    }
                    active.group_id = ActiveValue::Set(group_id);
                }
                if let Some(goal) = cmd.goal.clone() {
                    active.goal_type = ActiveValue::Set(goal.as_ref().map(|g| g.goal_type.clone()));
                    active.goal_amount_minor =
                        ActiveValue::Set(goal.as_ref().and_then(|g| g.amount_minor));
                    active.goal_target_date =
                        ActiveValue::Set(goal.as_ref().and_then(|g| g.target_date));
                    active.goal_frequency = ActiveValue::Set(goal.and_then(|g| g.frequency));
                }
                if let Some(is_active) = cmd.is_active {
                    active.is_active = ActiveValue::Set(is_active);
                }
                active.updated_at = ActiveValue::Set(now);
                Category::try_from(categories::Entity::update(active).exec(&tx).await?)
            }
            .await
        })
    }

    pub async fn get_category(&self, category_id: &str) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::CategoryNotFound(category_id.to_string()))?;
        Category::try_from(model)
    }

    pub async fn list_categories(&self, include_inactive: bool) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find().order_by_asc(categories::Column::CategoryId);
        if !include_inactive {
            query = query.filter(categories::Column::IsActive.eq(true));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Envelope state of one category for one month, without materializing.
    ///
    /// Months with no row report zero flows and the latest earlier month's
    /// available balance.
    pub async fn category_month_state(
        &self,
        category_id: &str,
        month: NaiveDate,
    ) -> ResultEngine<CategoryMonthState> {
        let month = month_start(month);
        if categories::Entity::find_by_id(category_id)
            .one(&self.database)
            .await?
            .is_none()
        {
            return Err(EngineError::CategoryNotFound(category_id.to_string()));
        }
        if let Some(row) =
            monthly_state::Entity::find_by_id((category_id.to_string(), month))
                .one(&self.database)
                .await?
        {
            return Ok(CategoryMonthState::from(row));
        }
        let carried = monthly_state::Entity::find()
            .filter(monthly_state::Column::CategoryId.eq(category_id))
            .filter(monthly_state::Column::MonthStart.lt(month))
            .order_by_desc(monthly_state::Column::MonthStart)
            .one(&self.database)
            .await?
            .map_or(0, |row| row.available_minor);
        Ok(CategoryMonthState {
            category_id: category_id.to_string(),
            month_start: month,
            allocated_minor: 0,
            inflow_minor: 0,
            activity_minor: 0,
            available_minor: carried,
        })
    }

    /// Envelope states of every active non-system category for one month.
    pub async fn month_overview(&self, month: NaiveDate) -> ResultEngine<Vec<CategoryMonthDetail>> {
        let month = month_start(month);
        let categories = self.list_categories(false).await?;
        let mut details = Vec::new();
        for category in categories {
            if category.is_system {
                continue;
            }
            let state = self.category_month_state(&category.category_id, month).await?;
            details.push(CategoryMonthDetail { category, state });
        }
        Ok(details)
    }
}
