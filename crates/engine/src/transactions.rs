//! Ledger primitives.
//!
//! A `TransactionVersion` is one immutable state of a concept (the stable
//! identity of a real-world transaction across edits). Versions carry a
//! `[valid_from, valid_to)` interval; the open end is a far-future sentinel
//! and `is_active` is true exactly for the sentinel-ended row. Editing a
//! concept closes the prior version and inserts a new one; voiding closes it
//! with no replacement.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Open end of the final validity interval.
#[must_use]
pub fn open_end_sentinel() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Cleared,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Cleared => "cleared",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "cleared" => Ok(Self::Cleared),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionVersion {
    pub transaction_version_id: Uuid,
    pub concept_id: Uuid,
    pub account_id: String,
    pub category_id: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub status: TransactionStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: bool,
    pub recorded_at: DateTime<Utc>,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub transaction_version_id: String,
    pub concept_id: String,
    pub account_id: String,
    pub category_id: String,
    pub transaction_date: Date,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub status: String,
    pub valid_from: DateTimeUtc,
    pub valid_to: DateTimeUtc,
    pub is_active: bool,
    pub recorded_at: DateTimeUtc,
    pub source: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::AccountId"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::CategoryId"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TransactionVersion> for ActiveModel {
    fn from(version: &TransactionVersion) -> Self {
        Self {
            transaction_version_id: ActiveValue::Set(version.transaction_version_id.to_string()),
            concept_id: ActiveValue::Set(version.concept_id.to_string()),
            account_id: ActiveValue::Set(version.account_id.clone()),
            category_id: ActiveValue::Set(version.category_id.clone()),
            transaction_date: ActiveValue::Set(version.transaction_date),
            amount_minor: ActiveValue::Set(version.amount_minor),
            memo: ActiveValue::Set(version.memo.clone()),
            status: ActiveValue::Set(version.status.as_str().to_string()),
            valid_from: ActiveValue::Set(version.valid_from),
            valid_to: ActiveValue::Set(version.valid_to),
            is_active: ActiveValue::Set(version.is_active),
            recorded_at: ActiveValue::Set(version.recorded_at),
            source: ActiveValue::Set(version.source.clone()),
        }
    }
}

impl TryFrom<Model> for TransactionVersion {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse_id = |value: &str| -> ResultEngine<Uuid> {
            Uuid::parse_str(value).map_err(|_| {
                EngineError::InvalidTransaction(format!("invalid version id: {value}"))
            })
        };
        Ok(Self {
            transaction_version_id: parse_id(&model.transaction_version_id)?,
            concept_id: parse_id(&model.concept_id)?,
            account_id: model.account_id,
            category_id: model.category_id,
            transaction_date: model.transaction_date,
            amount_minor: model.amount_minor,
            memo: model.memo,
            status: TransactionStatus::try_from(model.status.as_str())?,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            is_active: model.is_active,
            recorded_at: model.recorded_at,
            source: model.source,
        })
    }
}
