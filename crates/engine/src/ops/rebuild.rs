//! Full cache rebuild from the authoritative ledger.
//!
//! Recomputes `accounts.current_balance_minor` and the whole
//! `budget_category_monthly_state` table from active transaction versions
//! and allocation rows, inside one transaction. The incremental maintenance
//! in `effects` must land on exactly the state this produces; byte-identity
//! between the two paths is the correctness check for both.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, EntityTrait, QueryFilter, Statement, TransactionTrait, prelude::*,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    ResultEngine, accounts, allocations, categories, monthly_state,
    month::month_start,
    ops::{Engine, RTA_CATEGORY_ID, derive_payment_category_id, with_tx},
    transactions,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub account_rows: u64,
    pub month_rows: u64,
}

#[derive(Clone, Copy, Default)]
struct MonthAggregates {
    allocated: i64,
    inflow: i64,
    activity: i64,
}

/// In-memory replay state, keyed for deterministic insert order.
#[derive(Default)]
struct MonthLedger {
    aggregates: BTreeMap<(String, NaiveDate), MonthAggregates>,
    month_index: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl MonthLedger {
    fn touch(&mut self, category_id: &str, month: NaiveDate) -> &mut MonthAggregates {
        self.month_index
            .entry(category_id.to_string())
            .or_default()
            .insert(month);
        self.aggregates
            .entry((category_id.to_string(), month))
            .or_default()
    }
}

impl Engine {
    /// Recompute both aggregate caches from the ledger.
    pub async fn rebuild_caches(&self) -> ResultEngine<RebuildSummary> {
        with_tx!(self, |tx| {
            async {
                info!("cache rebuild start");
                let backend = tx.get_database_backend();
                let accounts_updated = tx
                    .execute(Statement::from_string(
                        backend,
                        "UPDATE accounts \
                         SET current_balance_minor = COALESCE( \
                                 (SELECT SUM(t.amount_minor) FROM transactions t \
                                  WHERE t.account_id = accounts.account_id \
                                    AND t.is_active = TRUE), 0), \
                             updated_at = CURRENT_TIMESTAMP",
                    ))
                    .await?
                    .rows_affected();

                let is_system: HashMap<String, bool> = categories::Entity::find()
                    .all(&tx)
                    .await?
                    .into_iter()
                    .map(|c| (c.category_id, c.is_system))
                    .collect();
                let is_credit: HashMap<String, bool> = accounts::Entity::find()
                    .all(&tx)
                    .await?
                    .into_iter()
                    .map(|a| {
                        let credit = a.account_type == "liability" && a.account_class == "credit";
                        (a.account_id, credit)
                    })
                    .collect();

                let mut ledger = MonthLedger::default();

                // Months already materialized stay materialized, even when
                // they end up all-zero, so reporting rows do not vanish.
                for row in monthly_state::Entity::find().all(&tx).await? {
                    ledger.touch(&row.category_id, row.month_start);
                }

                for row in allocations::Entity::find().all(&tx).await? {
                    ledger
                        .touch(&row.to_category_id, row.month_start)
                        .allocated += row.amount_minor;
                    if let Some(from) = row.from_category_id.as_deref()
                        && from != RTA_CATEGORY_ID
                    {
                        ledger.touch(from, row.month_start).allocated -= row.amount_minor;
                    }
                }

                let active_versions = transactions::Entity::find()
                    .filter(transactions::Column::IsActive.eq(true))
                    .all(&tx)
                    .await?;
                for version in active_versions {
                    let month = month_start(version.transaction_date);
                    let system = is_system
                        .get(version.category_id.as_str())
                        .copied()
                        .unwrap_or(false);
                    if system {
                        continue;
                    }
                    ledger.touch(&version.category_id, month).activity += -version.amount_minor;

                    let credit = is_credit
                        .get(version.account_id.as_str())
                        .copied()
                        .unwrap_or(false);
                    if credit && version.amount_minor != 0 {
                        let payment_category_id =
                            derive_payment_category_id(&version.account_id);
                        if !is_system.contains_key(payment_category_id.as_str()) {
                            debug!(
                                category_id = %payment_category_id,
                                "skip credit reserve for missing payment category"
                            );
                            continue;
                        }
                        let delta = version.amount_minor.abs();
                        let sign = if version.amount_minor < 0 { 1 } else { -1 };
                        ledger.touch(&payment_category_id, month).inflow += sign * delta;
                    }
                }

                monthly_state::Entity::delete_many().exec(&tx).await?;

                let mut rows = Vec::new();
                for (category_id, months) in &ledger.month_index {
                    let mut running_available = 0i64;
                    for month in months {
                        let entry = ledger
                            .aggregates
                            .get(&(category_id.clone(), *month))
                            .copied()
                            .unwrap_or_default();
                        running_available += entry.allocated + entry.inflow - entry.activity;
                        rows.push(monthly_state::ActiveModel::from(
                            &crate::CategoryMonthState {
                                category_id: category_id.clone(),
                                month_start: *month,
                                allocated_minor: entry.allocated,
                                inflow_minor: entry.inflow,
                                activity_minor: entry.activity,
                                available_minor: running_available,
                            },
                        ));
                    }
                }
                let month_rows = rows.len() as u64;
                if !rows.is_empty() {
                    monthly_state::Entity::insert_many(rows).exec(&tx).await?;
                }

                info!(account_rows = accounts_updated, month_rows, "cache rebuild done");
                Ok(RebuildSummary {
                    account_rows: accounts_updated,
                    month_rows,
                })
            }
            .await
        })
    }
}
