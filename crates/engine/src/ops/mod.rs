use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait};

use crate::{
    Account, Category, EngineError, ResultEngine,
    accounts,
    categories,
    clock::{Clock, SystemClock},
};

mod accounts_admin;
mod allocations;
mod categories_admin;
mod effects;
mod rebuild;
mod reconciliation;
mod transactions;

pub use categories_admin::CategoryMonthDetail;
pub use rebuild::RebuildSummary;
pub use transactions::{TransactionOutcome, TransferOutcome};

/// Maximum number of days a transaction may be dated into the future.
pub const MAX_FUTURE_DAYS: i64 = 5;

/// Origin tag stamped on every version written through the engine.
pub(crate) const SOURCE: &str = "api";

/// System category used for the receiving leg of a transfer.
pub const TRANSFER_CATEGORY_ID: &str = "account_transfer";

/// System category whose inflows feed Ready-to-Assign.
pub const RTA_CATEGORY_ID: &str = "available_to_budget";

/// Reserved prefix for auto-provisioned credit payment envelopes.
pub(crate) const PAYMENT_CATEGORY_PREFIX: &str = "payment_";

/// Group that collects the auto-provisioned credit payment envelopes.
pub(crate) const CREDIT_PAYMENTS_GROUP_ID: &str = "credit_card_payments";

/// Id of the payment envelope tied to a credit account.
#[must_use]
pub fn derive_payment_category_id(account_id: &str) -> String {
    format!("{PAYMENT_CATEGORY_PREFIX}{account_id}")
}

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Load an account and require it to exist and be active.
async fn require_active_account(
    tx: &DatabaseTransaction,
    account_id: &str,
) -> ResultEngine<Account> {
    let model = accounts::Entity::find_by_id(account_id)
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::UnknownAccount(account_id.to_string()))?;
    if !model.is_active {
        return Err(EngineError::UnknownAccount(account_id.to_string()));
    }
    Account::try_from(model)
}

/// Load a category and require it to exist and be active.
async fn require_active_category(
    tx: &DatabaseTransaction,
    category_id: &str,
) -> ResultEngine<Category> {
    let model = categories::Entity::find_by_id(category_id)
        .one(tx)
        .await?
        .ok_or_else(|| EngineError::UnknownCategory(category_id.to_string()))?;
    if !model.is_active {
        return Err(EngineError::UnknownCategory(category_id.to_string()));
    }
    Category::try_from(model)
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidTransaction(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the wall clock, mainly for tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
