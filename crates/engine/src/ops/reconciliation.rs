//! Reconciliation checkpoints and the review worksheet.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    EngineError, ReconciliationCheckpoint, ResultEngine, WorksheetEntry, accounts, categories,
    commands::CheckpointCmd,
    ops::{Engine, with_tx},
    reconciliations, transactions,
    transactions::TransactionVersion,
};

/// Worksheet cutoff for accounts that have never been reconciled.
fn default_reconciliation_start() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Engine {
    /// Record a statement checkpoint for an account.
    ///
    /// Links to the account's previous checkpoint, if any, forming a chain.
    pub async fn create_checkpoint(
        &self,
        cmd: CheckpointCmd,
    ) -> ResultEngine<ReconciliationCheckpoint> {
        let now = self.clock.now();
        with_tx!(self, |tx| {
            async {
                let account = accounts::Entity::find_by_id(&cmd.account_id)
                    .one(&tx)
                    .await?
                    .ok_or_else(|| EngineError::AccountNotFound(cmd.account_id.clone()))?;
                if !account.is_active {
                    return Err(EngineError::AccountNotFound(cmd.account_id.clone()));
                }

                let previous = latest_checkpoint_on(&tx, &cmd.account_id).await?;
                let checkpoint = ReconciliationCheckpoint {
                    reconciliation_id: Uuid::new_v4(),
                    account_id: cmd.account_id.clone(),
                    created_at: now,
                    statement_date: cmd.statement_date,
                    statement_balance_minor: cmd.statement_balance_minor,
                    statement_pending_total_minor: cmd.statement_pending_total_minor,
                    previous_reconciliation_id: previous.map(|p| p.reconciliation_id),
                };
                reconciliations::Entity::insert(reconciliations::ActiveModel::from(&checkpoint))
                    .exec(&tx)
                    .await?;

                info!(
                    account_id = %checkpoint.account_id,
                    statement_date = %checkpoint.statement_date,
                    "reconciliation checkpoint recorded"
                );
                Ok(checkpoint)
            }
            .await
        })
    }

    /// Most recent checkpoint for an account, if any.
    pub async fn latest_checkpoint(
        &self,
        account_id: &str,
    ) -> ResultEngine<Option<ReconciliationCheckpoint>> {
        latest_checkpoint_on(&self.database, account_id).await
    }

    /// Active versions for the account needing review: anything recorded
    /// after the latest checkpoint, plus anything still pending.
    pub async fn reconciliation_worksheet(
        &self,
        account_id: &str,
    ) -> ResultEngine<Vec<WorksheetEntry>> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(account_id.to_string()))?;
        let cutoff = latest_checkpoint_on(&self.database, account_id)
            .await?
            .map_or_else(default_reconciliation_start, |c| c.created_at);

        let category_names: HashMap<String, String> = categories::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|c| (c.category_id, c.name))
            .collect();

        let versions = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .filter(transactions::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(transactions::Column::RecordedAt.gt(cutoff))
                    .add(transactions::Column::Status.eq("pending")),
            )
            .order_by_asc(transactions::Column::TransactionDate)
            .order_by_asc(transactions::Column::RecordedAt)
            .all(&self.database)
            .await?;

        versions
            .into_iter()
            .map(|model| {
                let version = TransactionVersion::try_from(model)?;
                let category_name = category_names
                    .get(version.category_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| version.category_id.clone());
                Ok(WorksheetEntry {
                    transaction_version_id: version.transaction_version_id,
                    concept_id: version.concept_id,
                    account_id: version.account_id,
                    account_name: account.name.clone(),
                    category_id: version.category_id,
                    category_name,
                    transaction_date: version.transaction_date,
                    amount_minor: version.amount_minor,
                    memo: version.memo,
                    status: version.status,
                    recorded_at: version.recorded_at,
                })
            })
            .collect()
    }
}

async fn latest_checkpoint_on<C: sea_orm::ConnectionTrait>(
    conn: &C,
    account_id: &str,
) -> ResultEngine<Option<ReconciliationCheckpoint>> {
    reconciliations::Entity::find()
        .filter(reconciliations::Column::AccountId.eq(account_id))
        .order_by_desc(reconciliations::Column::CreatedAt)
        .one(conn)
        .await?
        .map(ReconciliationCheckpoint::try_from)
        .transpose()
}
