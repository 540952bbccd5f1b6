//! Account administration.
//!
//! Creating a credit liability also provisions its payment envelope: a
//! dedicated category under the shared credit payments group, named after
//! the account, which the payment-reserve side effect feeds.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::info;

use crate::{
    Account, EngineError, ResultEngine, accounts, categories, category_groups,
    commands::{NewAccountCmd, UpdateAccountCmd},
    ops::{
        CREDIT_PAYMENTS_GROUP_ID, Engine, derive_payment_category_id, normalize_required_name,
        with_tx,
    },
};

impl Engine {
    /// Register a new account.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let now = self.clock.now();

        with_tx!(self, |tx| {
            async {
                if accounts::Entity::find_by_id(&cmd.account_id)
                    .one(&tx)
                    .await?
                    .is_some()
                {
                    return Err(EngineError::AlreadyExists(format!(
                        "Account `{}`",
                        cmd.account_id
                    )));
                }

                let model = accounts::ActiveModel {
                    account_id: ActiveValue::Set(cmd.account_id.clone()),
                    name: ActiveValue::Set(name.clone()),
                    account_type: ActiveValue::Set(cmd.account_type.as_str().to_string()),
                    account_class: ActiveValue::Set(cmd.account_class.as_str().to_string()),
                    account_role: ActiveValue::Set(cmd.account_role.as_str().to_string()),
                    current_balance_minor: ActiveValue::Set(0),
                    currency: ActiveValue::Set(cmd.currency.clone()),
                    is_active: ActiveValue::Set(true),
                    opened_on: ActiveValue::Set(cmd.opened_on),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                };
                let inserted = accounts::Entity::insert(model)
                    .exec_with_returning(&tx)
                    .await?;
                let account = Account::try_from(inserted)?;

                if account.is_credit_liability() {
                    provision_payment_envelope(&tx, &account, now).await?;
                }

                info!(account_id = %account.account_id, "account created");
                Ok(account)
            }
            .await
        })
    }

    /// Apply a partial update to an account.
    pub async fn update_account(
        &self,
        account_id: &str,
        cmd: UpdateAccountCmd,
    ) -> ResultEngine<Account> {
        let now = self.clock.now();
        with_tx!(self, |tx| {
            async {
                let model = accounts::Entity::find_by_id(account_id)
                    .one(&tx)
                    .await?
                    .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))?;
                let mut active: accounts::ActiveModel = model.into();
                if let Some(name) = cmd.name.as_deref() {
                    active.name = ActiveValue::Set(normalize_required_name(name, "account")?);
                }
                if let Some(role) = cmd.account_role {
                    active.account_role = ActiveValue::Set(role.as_str().to_string());
                }
                if let Some(is_active) = cmd.is_active {
                    active.is_active = ActiveValue::Set(is_active);
                }
                active.updated_at = ActiveValue::Set(now);
                Account::try_from(accounts::Entity::update(active).exec(&tx).await?)
            }
            .await
        })
    }

    pub async fn get_account(&self, account_id: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))?;
        Account::try_from(model)
    }

    pub async fn list_accounts(&self, include_inactive: bool) -> ResultEngine<Vec<Account>> {
        let mut query = accounts::Entity::find().order_by_asc(accounts::Column::AccountId);
        if !include_inactive {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }
}

async fn provision_payment_envelope(
    tx: &DatabaseTransaction,
    account: &Account,
    now: chrono::DateTime<chrono::Utc>,
) -> ResultEngine<()> {
    if category_groups::Entity::find_by_id(CREDIT_PAYMENTS_GROUP_ID)
        .one(tx)
        .await?
        .is_none()
    {
        let group = category_groups::ActiveModel {
            group_id: ActiveValue::Set(CREDIT_PAYMENTS_GROUP_ID.to_string()),
            name: ActiveValue::Set("Credit Card Payments".to_string()),
            sort_order: ActiveValue::Set(-1000),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        category_groups::Entity::insert(group).exec(tx).await?;
    }

    let payment_category_id = derive_payment_category_id(&account.account_id);
    if categories::Entity::find_by_id(&payment_category_id)
        .one(tx)
        .await?
        .is_none()
    {
        let category = categories::ActiveModel {
            category_id: ActiveValue::Set(payment_category_id.clone()),
            group_id: ActiveValue::Set(Some(CREDIT_PAYMENTS_GROUP_ID.to_string())),
            name: ActiveValue::Set(account.name.clone()),
            is_active: ActiveValue::Set(true),
            is_system: ActiveValue::Set(false),
            goal_type: ActiveValue::Set(None),
            goal_amount_minor: ActiveValue::Set(None),
            goal_target_date: ActiveValue::Set(None),
            goal_frequency: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        categories::Entity::insert(category).exec(tx).await?;
        info!(category_id = %payment_category_id, "payment envelope provisioned");
    }
    Ok(())
}
