//! Reconciliation checkpoints.
//!
//! A checkpoint snapshots an external statement for one account and links
//! back to the previous checkpoint, forming a chain per account. The
//! worksheet query lists versions recorded after the latest checkpoint, plus
//! anything still pending, for review.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, transactions::TransactionStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCheckpoint {
    pub reconciliation_id: Uuid,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub statement_date: NaiveDate,
    pub statement_balance_minor: i64,
    pub statement_pending_total_minor: i64,
    pub previous_reconciliation_id: Option<Uuid>,
}

/// One ledger row on a reconciliation worksheet, denormalized for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetEntry {
    pub transaction_version_id: Uuid,
    pub concept_id: Uuid,
    pub account_id: String,
    pub account_name: String,
    pub category_id: String,
    pub category_name: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub status: TransactionStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reconciliation_id: String,
    pub account_id: String,
    pub created_at: DateTimeUtc,
    pub statement_date: Date,
    pub statement_balance_minor: i64,
    pub statement_pending_total_minor: i64,
    pub previous_reconciliation_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::AccountId"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ReconciliationCheckpoint> for ActiveModel {
    fn from(checkpoint: &ReconciliationCheckpoint) -> Self {
        Self {
            reconciliation_id: ActiveValue::Set(checkpoint.reconciliation_id.to_string()),
            account_id: ActiveValue::Set(checkpoint.account_id.clone()),
            created_at: ActiveValue::Set(checkpoint.created_at),
            statement_date: ActiveValue::Set(checkpoint.statement_date),
            statement_balance_minor: ActiveValue::Set(checkpoint.statement_balance_minor),
            statement_pending_total_minor: ActiveValue::Set(
                checkpoint.statement_pending_total_minor,
            ),
            previous_reconciliation_id: ActiveValue::Set(
                checkpoint
                    .previous_reconciliation_id
                    .map(|id| id.to_string()),
            ),
        }
    }
}

impl TryFrom<Model> for ReconciliationCheckpoint {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse_id = |value: &str| {
            Uuid::parse_str(value).map_err(|_| {
                EngineError::InvalidTransaction(format!("invalid reconciliation id: {value}"))
            })
        };
        Ok(Self {
            reconciliation_id: parse_id(&model.reconciliation_id)?,
            account_id: model.account_id,
            created_at: model.created_at,
            statement_date: model.statement_date,
            statement_balance_minor: model.statement_balance_minor,
            statement_pending_total_minor: model.statement_pending_total_minor,
            previous_reconciliation_id: model
                .previous_reconciliation_id
                .as_deref()
                .map(parse_id)
                .transpose()?,
        })
    }
}
