//! Transaction write path and listings.
//!
//! Creates, edits and voids all go through the same version machinery: a new
//! version opens with the far-future sentinel, a closing write stamps the
//! prior version's `valid_to` with a compare-and-set on `is_active`, and the
//! cache effects of a closed version are reversed before the replacement's
//! effects are applied. Losing the compare-and-set surfaces as a `Conflict`.

use chrono::Duration;
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    Account, Category, CategoryMonthState, EngineError, ResultEngine, accounts, categories,
    commands::{NewTransactionCmd, TransferCmd},
    month::month_start,
    monthly_state,
    ops::{
        Engine, MAX_FUTURE_DAYS, SOURCE, TRANSFER_CATEGORY_ID, effects, normalize_optional_text,
        require_active_account, require_active_category, with_tx,
    },
    transactions::{self, TransactionStatus, TransactionVersion, open_end_sentinel},
};

/// Post-write snapshot returned by the single-leg write operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionOutcome {
    pub version: TransactionVersion,
    pub account_balance_minor: i64,
    /// Monthly envelope state after the write, absent for system categories.
    pub category_month: Option<CategoryMonthState>,
}

/// Post-write snapshot for a two-leg transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub concept_id: Uuid,
    pub source: TransactionOutcome,
    pub destination: TransactionOutcome,
}

fn validate_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor == 0 {
        return Err(EngineError::InvalidTransaction(
            "Transaction amount must not be zero.".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    fn validate_date(&self, date: chrono::NaiveDate) -> ResultEngine<()> {
        if date > self.clock.today() + Duration::days(MAX_FUTURE_DAYS) {
            return Err(EngineError::InvalidTransaction(format!(
                "Transaction date may be at most {MAX_FUTURE_DAYS} days in the future."
            )));
        }
        Ok(())
    }

    /// Record a transaction version.
    ///
    /// Without `concept_id` this opens a new concept. With it, the concept's
    /// active version is closed first and its cache effects reversed, so the
    /// caches end up as if the new version had been the only one.
    pub async fn create_transaction(
        &self,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<TransactionOutcome> {
        validate_amount(cmd.amount_minor)?;
        self.validate_date(cmd.transaction_date)?;
        let now = self.clock.now();

        with_tx!(self, |tx| {
            async {
                let account = require_active_account(&tx, &cmd.account_id).await?;
                let category = require_active_category(&tx, &cmd.category_id).await?;

                let concept_id = match cmd.concept_id {
                    Some(concept_id) => {
                        close_active_version(&tx, concept_id, now).await?;
                        concept_id
                    }
                    None => Uuid::new_v4(),
                };

                let version = TransactionVersion {
                    transaction_version_id: Uuid::new_v4(),
                    concept_id,
                    account_id: account.account_id.clone(),
                    category_id: category.category_id.clone(),
                    transaction_date: cmd.transaction_date,
                    amount_minor: cmd.amount_minor,
                    memo: normalize_optional_text(cmd.memo.as_deref()),
                    status: cmd.status,
                    valid_from: now,
                    valid_to: open_end_sentinel(),
                    is_active: true,
                    recorded_at: now,
                    source: SOURCE.to_string(),
                };
                transactions::Entity::insert(transactions::ActiveModel::from(&version))
                    .exec(&tx)
                    .await?;
                effects::apply_version_effects(&tx, &version, &account, &category, 1).await?;

                info!(
                    concept_id = %concept_id,
                    account_id = %version.account_id,
                    amount_minor = version.amount_minor,
                    "transaction version recorded"
                );
                outcome_snapshot(&tx, version, &category).await
            }
            .await
        })
    }

    /// Close a concept's active version without a replacement, reversing its
    /// cache effects.
    pub async fn void_transaction(&self, concept_id: Uuid) -> ResultEngine<TransactionOutcome> {
        let now = self.clock.now();
        with_tx!(self, |tx| {
            async {
                let mut closed = close_active_version(&tx, concept_id, now).await?;
                closed.valid_to = now;
                closed.is_active = false;
                let category = load_category(&tx, &closed.category_id).await?;

                info!(concept_id = %concept_id, "transaction voided");
                outcome_snapshot(&tx, closed, &category).await
            }
            .await
        })
    }

    /// Move money between two accounts as a cleared two-leg transfer.
    ///
    /// The outgoing leg carries the caller's category and all envelope
    /// effects; the incoming leg lands on the transfer system category and
    /// only touches the destination balance.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidTransaction(
                "Transfer amount must be positive.".to_string(),
            ));
        }
        if cmd.source_account_id == cmd.destination_account_id {
            return Err(EngineError::InvalidTransaction(
                "Transfer source and destination accounts must differ.".to_string(),
            ));
        }
        self.validate_date(cmd.transaction_date)?;
        let now = self.clock.now();

        with_tx!(self, |tx| {
            async {
                let source_account = require_active_account(&tx, &cmd.source_account_id).await?;
                let destination_account =
                    require_active_account(&tx, &cmd.destination_account_id).await?;
                let category = require_active_category(&tx, &cmd.category_id).await?;
                let transfer_category = require_active_category(&tx, TRANSFER_CATEGORY_ID).await?;

                let concept_id = Uuid::new_v4();
                let memo = normalize_optional_text(cmd.memo.as_deref());
                let leg = |account_id: &str, category_id: &str, amount_minor: i64| {
                    TransactionVersion {
                        transaction_version_id: Uuid::new_v4(),
                        concept_id,
                        account_id: account_id.to_string(),
                        category_id: category_id.to_string(),
                        transaction_date: cmd.transaction_date,
                        amount_minor,
                        memo: memo.clone(),
                        status: TransactionStatus::Cleared,
                        valid_from: now,
                        valid_to: open_end_sentinel(),
                        is_active: true,
                        recorded_at: now,
                        source: SOURCE.to_string(),
                    }
                };

                let outgoing = leg(
                    &source_account.account_id,
                    &category.category_id,
                    -cmd.amount_minor,
                );
                let incoming = leg(
                    &destination_account.account_id,
                    &transfer_category.category_id,
                    cmd.amount_minor,
                );

                transactions::Entity::insert_many([
                    transactions::ActiveModel::from(&outgoing),
                    transactions::ActiveModel::from(&incoming),
                ])
                .exec(&tx)
                .await?;
                effects::apply_version_effects(&tx, &outgoing, &source_account, &category, 1)
                    .await?;
                effects::apply_version_effects(
                    &tx,
                    &incoming,
                    &destination_account,
                    &transfer_category,
                    1,
                )
                .await?;

                info!(
                    concept_id = %concept_id,
                    source = %source_account.account_id,
                    destination = %destination_account.account_id,
                    amount_minor = cmd.amount_minor,
                    "transfer recorded"
                );
                let source = outcome_snapshot(&tx, outgoing, &category).await?;
                let destination = outcome_snapshot(&tx, incoming, &transfer_category).await?;
                Ok(TransferOutcome {
                    concept_id,
                    source,
                    destination,
                })
            }
            .await
        })
    }

    /// Active version of one concept, if any.
    pub async fn find_active_version(
        &self,
        concept_id: Uuid,
    ) -> ResultEngine<Option<TransactionVersion>> {
        transactions::Entity::find()
            .filter(transactions::Column::ConceptId.eq(concept_id.to_string()))
            .filter(transactions::Column::IsActive.eq(true))
            .one(&self.database)
            .await?
            .map(TransactionVersion::try_from)
            .transpose()
    }

    /// Most recent active versions, optionally scoped to one account.
    pub async fn list_recent_transactions(
        &self,
        account_id: Option<&str>,
        limit: u64,
    ) -> ResultEngine<Vec<TransactionVersion>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::IsActive.eq(true))
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::RecordedAt)
            .limit(limit);
        if let Some(account_id) = account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(TransactionVersion::try_from)
            .collect()
    }

    /// Full version history of one concept, oldest first.
    pub async fn concept_history(&self, concept_id: Uuid) -> ResultEngine<Vec<TransactionVersion>> {
        transactions::Entity::find()
            .filter(transactions::Column::ConceptId.eq(concept_id.to_string()))
            .order_by_asc(transactions::Column::ValidFrom)
            .all(&self.database)
            .await?
            .into_iter()
            .map(TransactionVersion::try_from)
            .collect()
    }
}

/// Close the active version of `concept_id`, reverse its cache effects and
/// return it as it was while active.
///
/// The close is a compare-and-set on the version id: a concurrent writer that
/// already closed it makes `rows_affected` zero, which is a `Conflict`.
async fn close_active_version(
    tx: &DatabaseTransaction,
    concept_id: Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> ResultEngine<TransactionVersion> {
    let prior = transactions::Entity::find()
        .filter(transactions::Column::ConceptId.eq(concept_id.to_string()))
        .filter(transactions::Column::IsActive.eq(true))
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::ConceptNotFound(concept_id.to_string()))?;
    let prior = TransactionVersion::try_from(prior)?;

    let closed = transactions::Entity::update_many()
        .col_expr(transactions::Column::ValidTo, Expr::value(now))
        .col_expr(transactions::Column::IsActive, Expr::value(false))
        .filter(
            transactions::Column::TransactionVersionId
                .eq(prior.transaction_version_id.to_string()),
        )
        .filter(transactions::Column::IsActive.eq(true))
        .exec(tx)
        .await?;
    if closed.rows_affected == 0 {
        return Err(EngineError::Conflict(format!(
            "version {} of concept {concept_id} was closed concurrently",
            prior.transaction_version_id
        )));
    }

    let account = load_account(tx, &prior.account_id).await?;
    let category = load_category(tx, &prior.category_id).await?;
    effects::apply_version_effects(tx, &prior, &account, &category, -1).await?;
    Ok(prior)
}

/// Load an account regardless of its active flag, for effect reversal.
async fn load_account(tx: &DatabaseTransaction, account_id: &str) -> ResultEngine<Account> {
    let model = accounts::Entity::find_by_id(account_id)
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))?;
    Account::try_from(model)
}

/// Load a category regardless of its active flag, for effect reversal.
async fn load_category(tx: &DatabaseTransaction, category_id: &str) -> ResultEngine<Category> {
    let model = categories::Entity::find_by_id(category_id)
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::CategoryNotFound(category_id.to_string()))?;
    Category::try_from(model)
}

async fn outcome_snapshot(
    tx: &DatabaseTransaction,
    version: TransactionVersion,
    category: &Category,
) -> ResultEngine<TransactionOutcome> {
    let account_balance_minor = effects::account_balance(tx, &version.account_id).await?;
    let category_month = if category.is_system {
        None
    } else {
        monthly_state::Entity::find_by_id((
            version.category_id.clone(),
            month_start(version.transaction_date),
        ))
        .one(tx)
        .await?
        .map(CategoryMonthState::from)
    };
    Ok(TransactionOutcome {
        version,
        account_balance_minor,
        category_month,
    })
}
