pub use accounts::{Account, AccountClass, AccountRole, AccountType};
pub use allocations::Allocation;
pub use categories::{Category, CategoryGoal};
pub use category_groups::CategoryGroup;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::EngineError;
pub use monthly_state::CategoryMonthState;
pub use reconciliations::{ReconciliationCheckpoint, WorksheetEntry};
pub use transactions::{TransactionStatus, TransactionVersion, open_end_sentinel};

pub use ops::{
    CategoryMonthDetail, Engine, EngineBuilder, MAX_FUTURE_DAYS, RTA_CATEGORY_ID, RebuildSummary,
    TRANSFER_CATEGORY_ID, TransactionOutcome, TransferOutcome, derive_payment_category_id,
};

pub mod accounts;
pub mod allocations;
pub mod categories;
pub mod category_groups;
pub mod clock;
pub mod commands;
mod error;
pub mod month;
pub mod monthly_state;
mod ops;
pub mod reconciliations;
pub mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
