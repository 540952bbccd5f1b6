//! Budget allocation rows.
//!
//! An allocation moves budgetable funds into a category envelope for one
//! month, either from Ready-to-Assign (`from_category_id` is `None`) or from
//! another envelope. Allocation rows are append-only; the cache rebuild
//! replays them alongside the transaction log.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub allocation_id: Uuid,
    pub allocation_date: NaiveDate,
    pub month_start: NaiveDate,
    pub from_category_id: Option<String>,
    pub to_category_id: String,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub allocation_id: String,
    pub allocation_date: Date,
    pub month_start: Date,
    pub from_category_id: Option<String>,
    pub to_category_id: String,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::ToCategoryId",
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

impl From<&Allocation> for ActiveModel {
    fn from(allocation: &Allocation) -> Self {
        Self {
            allocation_id: ActiveValue::Set(allocation.allocation_id.to_string()),
            allocation_date: ActiveValue::Set(allocation.allocation_date),
            month_start: ActiveValue::Set(allocation.month_start),
            from_category_id: ActiveValue::Set(allocation.from_category_id.clone()),
            to_category_id: ActiveValue::Set(allocation.to_category_id.clone()),
            amount_minor: ActiveValue::Set(allocation.amount_minor),
            memo: ActiveValue::Set(allocation.memo.clone()),
            created_at: ActiveValue::Set(allocation.created_at),
        }
    }
}

impl TryFrom<Model> for Allocation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let allocation_id: ResultEngine<Uuid> =
            Uuid::parse_str(&model.allocation_id).map_err(|_| {
                EngineError::InvalidTransaction(format!(
                    "invalid allocation id: {}",
                    model.allocation_id
                ))
            });
        Ok(Self {
            allocation_id: allocation_id?,
            allocation_date: model.allocation_date,
            month_start: model.month_start,
            from_category_id: model.from_category_id,
            to_category_id: model.to_category_id,
            amount_minor: model.amount_minor,
            memo: model.memo,
            created_at: model.created_at,
        })
    }
}
