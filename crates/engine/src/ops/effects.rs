//! Incremental maintenance of the aggregate caches.
//!
//! Every ledger write funnels through `apply_version_effects`, once with
//! sign +1 when a version becomes active and once with sign -1 when it is
//! closed. Keeping both paths on the same code makes edits and voids exact
//! inverses of the original apply.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};
use tracing::debug;

use crate::{
    Account, Category, EngineError, ResultEngine, accounts, categories,
    month::month_start,
    monthly_state,
    ops::derive_payment_category_id,
    transactions::TransactionVersion,
};

/// Add `delta_minor` to the cached balance of an account.
pub(crate) async fn apply_account_delta(
    tx: &DatabaseTransaction,
    account_id: &str,
    delta_minor: i64,
) -> ResultEngine<()> {
    if delta_minor == 0 {
        return Ok(());
    }
    let backend = tx.get_database_backend();
    let updated = tx
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE accounts \
             SET current_balance_minor = current_balance_minor + ?, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE account_id = ?",
            [delta_minor.into(), account_id.into()],
        ))
        .await?;
    if updated.rows_affected() == 0 {
        return Err(EngineError::UnknownAccount(account_id.to_string()));
    }
    Ok(())
}

/// Fetch the monthly row for `(category_id, month)`, creating it when absent.
///
/// A fresh row seeds `available_minor` from the latest earlier month of the
/// same category, so carry-forward survives lazy materialization.
pub(crate) async fn materialize_month(
    tx: &DatabaseTransaction,
    category_id: &str,
    month: NaiveDate,
) -> ResultEngine<monthly_state::Model> {
    if let Some(existing) = monthly_state::Entity::find_by_id((category_id.to_string(), month))
        .one(tx)
        .await?
    {
        return Ok(existing);
    }

    let carried_available = monthly_state::Entity::find()
        .filter(monthly_state::Column::CategoryId.eq(category_id))
        .filter(monthly_state::Column::MonthStart.lt(month))
        .order_by_desc(monthly_state::Column::MonthStart)
        .one(tx)
        .await?
        .map_or(0, |row| row.available_minor);

    let row = monthly_state::ActiveModel {
        category_id: ActiveValue::Set(category_id.to_string()),
        month_start: ActiveValue::Set(month),
        allocated_minor: ActiveValue::Set(0),
        inflow_minor: ActiveValue::Set(0),
        activity_minor: ActiveValue::Set(0),
        available_minor: ActiveValue::Set(carried_available),
    };
    Ok(monthly_state::Entity::insert(row)
        .exec_with_returning(tx)
        .await?)
}

/// Apply deltas to one `(category, month)` row and ripple the available
/// change into every already materialized later month of that category.
pub(crate) async fn apply_month_delta(
    tx: &DatabaseTransaction,
    category_id: &str,
    month: NaiveDate,
    allocated_delta: i64,
    inflow_delta: i64,
    activity_delta: i64,
    available_delta: i64,
) -> ResultEngine<monthly_state::Model> {
    let row = materialize_month(tx, category_id, month).await?;
    let mut active: monthly_state::ActiveModel = row.clone().into();
    active.allocated_minor = ActiveValue::Set(row.allocated_minor + allocated_delta);
    active.inflow_minor = ActiveValue::Set(row.inflow_minor + inflow_delta);
    active.activity_minor = ActiveValue::Set(row.activity_minor + activity_delta);
    active.available_minor = ActiveValue::Set(row.available_minor + available_delta);
    let updated = monthly_state::Entity::update(active).exec(tx).await?;

    if available_delta != 0 {
        let backend = tx.get_database_backend();
        tx.execute(Statement::from_sql_and_values(
            backend,
            "UPDATE budget_category_monthly_state \
             SET available_minor = available_minor + ? \
             WHERE category_id = ? AND month_start > ?",
            [available_delta.into(), category_id.into(), month.into()],
        ))
        .await?;
    }
    Ok(updated)
}

/// Record spending activity. Positive `activity_delta` reduces available.
pub(crate) async fn record_activity(
    tx: &DatabaseTransaction,
    category_id: &str,
    month: NaiveDate,
    activity_delta: i64,
) -> ResultEngine<monthly_state::Model> {
    apply_month_delta(tx, category_id, month, 0, 0, activity_delta, -activity_delta).await
}

/// Adjust the allocated and available columns, for allocation moves.
pub(crate) async fn adjust_allocation(
    tx: &DatabaseTransaction,
    category_id: &str,
    month: NaiveDate,
    amount_minor: i64,
) -> ResultEngine<monthly_state::Model> {
    apply_month_delta(tx, category_id, month, amount_minor, 0, 0, amount_minor).await
}

/// Adjust the inflow and available columns, for credit payment reserves.
pub(crate) async fn adjust_inflow(
    tx: &DatabaseTransaction,
    category_id: &str,
    month: NaiveDate,
    amount_minor: i64,
) -> ResultEngine<monthly_state::Model> {
    apply_month_delta(tx, category_id, month, 0, amount_minor, 0, amount_minor).await
}

/// Reserve amount the credit payment envelope earns from one version.
///
/// Spending on a credit card (negative amount) frees cash that must cover
/// the future card payment, so the envelope gains the spent amount. Refunds
/// give it back.
#[must_use]
pub(crate) fn payment_reserve_delta(amount_minor: i64) -> i64 {
    if amount_minor < 0 {
        amount_minor.abs()
    } else {
        -amount_minor.abs()
    }
}

/// Apply (sign +1) or reverse (sign -1) all cache effects of one version.
pub(crate) async fn apply_version_effects(
    tx: &DatabaseTransaction,
    version: &TransactionVersion,
    account: &Account,
    category: &Category,
    sign: i64,
) -> ResultEngine<()> {
    apply_account_delta(tx, &version.account_id, sign * version.amount_minor).await?;

    if category.is_system {
        return Ok(());
    }

    let month = month_start(version.transaction_date);
    record_activity(tx, &version.category_id, month, sign * -version.amount_minor).await?;

    if account.is_credit_liability() && version.amount_minor != 0 {
        let payment_category_id = derive_payment_category_id(&account.account_id);
        let payment_exists = categories::Entity::find_by_id(&payment_category_id)
            .one(tx)
            .await?
            .is_some();
        if payment_exists {
            let delta = sign * payment_reserve_delta(version.amount_minor);
            adjust_inflow(tx, &payment_category_id, month, delta).await?;
        } else {
            debug!(
                account_id = %account.account_id,
                category_id = %payment_category_id,
                "payment envelope missing, skipping credit reserve"
            );
        }
    }
    Ok(())
}

/// Cached balance of an account, read inside the current transaction.
pub(crate) async fn account_balance(
    tx: &DatabaseTransaction,
    account_id: &str,
) -> ResultEngine<i64> {
    let model = accounts::Entity::find_by_id(account_id)
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))?;
    Ok(model.current_balance_minor)
}

#[cfg(test)]
mod tests {
    use super::payment_reserve_delta;

    #[test]
    fn charge_grows_reserve() {
        assert_eq!(payment_reserve_delta(-8000), 8000);
    }

    #[test]
    fn refund_shrinks_reserve() {
        assert_eq!(payment_reserve_delta(4500), -4500);
    }
}
