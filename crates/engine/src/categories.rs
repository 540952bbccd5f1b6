//! Budget categories (envelopes).
//!
//! System categories (`available_to_budget`, `account_transfer`,
//! `balance_adjustment`, `opening_balance`, …) never accumulate budget
//! activity or manual allocations; they exist so ledger rows always carry a
//! category id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub is_system: bool,
    pub goal: Option<CategoryGoal>,
}

/// Optional funding goal attached to an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGoal {
    pub goal_type: String,
    pub amount_minor: Option<i64>,
    pub target_date: Option<chrono::NaiveDate>,
    pub frequency: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub is_active: bool,
    pub is_system: bool,
    pub goal_type: Option<String>,
    pub goal_amount_minor: Option<i64>,
    pub goal_target_date: Option<Date>,
    pub goal_frequency: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::monthly_state::Entity")]
    MonthlyState,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::monthly_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyState.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            category_id: model.category_id,
            group_id: model.group_id,
            name: model.name,
            is_active: model.is_active,
            is_system: model.is_system,
            goal: model.goal_type.map(|goal_type| CategoryGoal {
                goal_type,
                amount_minor: model.goal_amount_minor,
                target_date: model.goal_target_date,
                frequency: model.goal_frequency,
            }),
        })
    }
}
