//! Per-category monthly budget cache.
//!
//! One row per `(category_id, month_start)` pair that has seen any budget
//! activity. `available_minor` carries forward across months:
//! `available(M) = available(M-1) + allocated(M) + inflow(M) - activity(M)`.
//! Months with no row report the latest earlier month's available balance.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMonthState {
    pub category_id: String,
    pub month_start: NaiveDate,
    pub allocated_minor: i64,
    pub inflow_minor: i64,
    pub activity_minor: i64,
    pub available_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_category_monthly_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub month_start: Date,
    pub allocated_minor: i64,
    pub inflow_minor: i64,
    pub activity_minor: i64,
    pub available_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::CategoryId"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CategoryMonthState> for ActiveModel {
    fn from(state: &CategoryMonthState) -> Self {
        Self {
            category_id: ActiveValue::Set(state.category_id.clone()),
            month_start: ActiveValue::Set(state.month_start),
            allocated_minor: ActiveValue::Set(state.allocated_minor),
            inflow_minor: ActiveValue::Set(state.inflow_minor),
            activity_minor: ActiveValue::Set(state.activity_minor),
            available_minor: ActiveValue::Set(state.available_minor),
        }
    }
}

impl From<Model> for CategoryMonthState {
    fn from(model: Model) -> Self {
        Self {
            category_id: model.category_id,
            month_start: model.month_start,
            allocated_minor: model.allocated_minor,
            inflow_minor: model.inflow_minor,
            activity_minor: model.activity_minor,
            available_minor: model.available_minor,
        }
    }
}
