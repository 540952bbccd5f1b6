//! Envelope allocation and the Ready-to-Assign query.

use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    Allocation, CategoryMonthState, EngineError, ResultEngine, allocations,
    commands::AllocationCmd,
    month::{month_start, next_month_start},
    ops::{Engine, RTA_CATEGORY_ID, effects, normalize_optional_text, require_active_category, with_tx},
};

impl Engine {
    /// Funds still unassigned as of the given month.
    ///
    /// Cumulative: every inflow to the budgetable income category dated
    /// before the next month, minus every allocation drawn from
    /// Ready-to-Assign up to and including the month.
    pub async fn ready_to_assign(&self, month: NaiveDate) -> ResultEngine<i64> {
        ready_to_assign_on(&self.database, month_start(month)).await
    }

    /// Move funds into a category envelope for one month.
    ///
    /// Funds come from Ready-to-Assign, or from another envelope when
    /// `from_category_id` is set. Returns the destination envelope's state
    /// for the credited month.
    pub async fn allocate(&self, cmd: AllocationCmd) -> ResultEngine<CategoryMonthState> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidTransaction(
                "Allocation amount must be positive.".to_string(),
            ));
        }
        if cmd
            .from_category_id
            .as_deref()
            .is_some_and(|from| from == cmd.to_category_id)
        {
            return Err(EngineError::InvalidTransaction(
                "Source and destination categories must differ.".to_string(),
            ));
        }
        let month = month_start(cmd.month_start.unwrap_or(cmd.allocation_date));
        let now = self.clock.now();

        with_tx!(self, |tx| {
            async {
                let destination = require_active_category(&tx, &cmd.to_category_id).await?;
                if destination.is_system {
                    return Err(EngineError::InvalidTransaction(
                        "Allocations must target a non-system category.".to_string(),
                    ));
                }

                if let Some(from_category_id) = cmd.from_category_id.as_deref() {
                    let source = require_active_category(&tx, from_category_id).await?;
                    if source.is_system {
                        return Err(EngineError::InvalidTransaction(
                            "Allocations cannot draw from a system category.".to_string(),
                        ));
                    }
                    let state = effects::materialize_month(&tx, from_category_id, month).await?;
                    if state.available_minor < cmd.amount_minor {
                        return Err(EngineError::InvalidTransaction(
                            "Source category does not have enough available funds.".to_string(),
                        ));
                    }
                } else {
                    let ready = ready_to_assign_on(&tx, month).await?;
                    if ready < cmd.amount_minor {
                        return Err(EngineError::InvalidTransaction(
                            "Ready-to-Assign is insufficient for this allocation.".to_string(),
                        ));
                    }
                }

                let allocation = Allocation {
                    allocation_id: Uuid::new_v4(),
                    allocation_date: cmd.allocation_date,
                    month_start: month,
                    from_category_id: cmd.from_category_id.clone(),
                    to_category_id: destination.category_id.clone(),
                    amount_minor: cmd.amount_minor,
                    memo: normalize_optional_text(cmd.memo.as_deref()),
                    created_at: now,
                };
                allocations::Entity::insert(allocations::ActiveModel::from(&allocation))
                    .exec(&tx)
                    .await?;

                let updated = effects::adjust_allocation(
                    &tx,
                    &destination.category_id,
                    month,
                    cmd.amount_minor,
                )
                .await?;
                if let Some(from_category_id) = cmd.from_category_id.as_deref() {
                    effects::adjust_allocation(&tx, from_category_id, month, -cmd.amount_minor)
                        .await?;
                }

                info!(
                    to_category_id = %destination.category_id,
                    month = %month,
                    amount_minor = cmd.amount_minor,
                    "allocation recorded"
                );
                Ok(CategoryMonthState::from(updated))
            }
            .await
        })
    }

    /// Allocation rows for one month, newest first.
    pub async fn list_allocations(
        &self,
        month: NaiveDate,
        limit: u64,
    ) -> ResultEngine<Vec<Allocation>> {
        allocations::Entity::find()
            .filter(allocations::Column::MonthStart.eq(month_start(month)))
            .order_by_desc(allocations::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Allocation::try_from)
            .collect()
    }
}

async fn ready_to_assign_on<C: ConnectionTrait>(conn: &C, month: NaiveDate) -> ResultEngine<i64> {
    let statement = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT COALESCE((SELECT SUM(amount_minor) FROM transactions \
                          WHERE is_active = TRUE AND category_id = ? \
                            AND transaction_date < ?), 0) \
              - COALESCE((SELECT SUM(amount_minor) FROM budget_allocations \
                          WHERE from_category_id IS NULL AND month_start <= ?), 0) \
           AS ready_to_assign_minor",
        [
            RTA_CATEGORY_ID.into(),
            next_month_start(month).into(),
            month.into(),
        ],
    );
    match conn.query_one(statement).await? {
        Some(row) => Ok(row.try_get("", "ready_to_assign_minor")?),
        None => Ok(0),
    }
}
