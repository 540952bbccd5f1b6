//! Account register.
//!
//! `current_balance_minor` is a cache column, not source of truth: it must
//! always equal the signed sum of active ledger versions for the account.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    Cash,
    Credit,
    Investment,
    Loan,
    Accessible,
    Tangible,
}

impl AccountClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
            Self::Investment => "investment",
            Self::Loan => "loan",
            Self::Accessible => "accessible",
            Self::Tangible => "tangible",
        }
    }
}

impl TryFrom<&str> for AccountClass {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit" => Ok(Self::Credit),
            "investment" => Ok(Self::Investment),
            "loan" => Ok(Self::Loan),
            "accessible" => Ok(Self::Accessible),
            "tangible" => Ok(Self::Tangible),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid account class: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    OnBudget,
    Tracking,
}

impl AccountRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnBudget => "on_budget",
            Self::Tracking => "tracking",
        }
    }
}

impl TryFrom<&str> for AccountRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "on_budget" => Ok(Self::OnBudget),
            "tracking" => Ok(Self::Tracking),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid account role: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_class: AccountClass,
    pub account_role: AccountRole,
    pub current_balance_minor: i64,
    pub currency: String,
    pub is_active: bool,
    pub opened_on: Option<NaiveDate>,
}

impl Account {
    /// Credit liabilities drive the payment-reserve side effect.
    pub fn is_credit_liability(&self) -> bool {
        self.account_type == AccountType::Liability && self.account_class == AccountClass::Credit
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    pub name: String,
    pub account_type: String,
    pub account_class: String,
    pub account_role: String,
    pub current_balance_minor: i64,
    pub currency: String,
    pub is_active: bool,
    pub opened_on: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: model.account_id,
            name: model.name,
            account_type: AccountType::try_from(model.account_type.as_str())?,
            account_class: AccountClass::try_from(model.account_class.as_str())?,
            account_role: AccountRole::try_from(model.account_role.as_str())?,
            current_balance_minor: model.current_balance_minor,
            currency: model.currency,
            is_active: model.is_active,
            opened_on: model.opened_on,
        })
    }
}
