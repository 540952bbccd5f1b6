//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    accounts::{AccountClass, AccountRole, AccountType},
    categories::CategoryGoal,
    transactions::TransactionStatus,
};

/// Record a new transaction version.
///
/// With `concept_id` unset this creates a fresh concept; with it set this
/// edits the named concept, closing its active version first.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub account_id: String,
    pub category_id: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
    pub status: TransactionStatus,
    pub concept_id: Option<Uuid>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        category_id: impl Into<String>,
        transaction_date: NaiveDate,
        amount_minor: i64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            category_id: category_id.into(),
            transaction_date,
            amount_minor,
            memo: None,
            status: TransactionStatus::Cleared,
            concept_id: None,
        }
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn concept_id(mut self, concept_id: Uuid) -> Self {
        self.concept_id = Some(concept_id);
        self
    }
}

/// Move money between two accounts as a paired cleared transaction.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub source_account_id: String,
    pub destination_account_id: String,
    pub category_id: String,
    pub transaction_date: NaiveDate,
    pub amount_minor: i64,
    pub memo: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        source_account_id: impl Into<String>,
        destination_account_id: impl Into<String>,
        category_id: impl Into<String>,
        transaction_date: NaiveDate,
        amount_minor: i64,
    ) -> Self {
        Self {
            source_account_id: source_account_id.into(),
            destination_account_id: destination_account_id.into(),
            category_id: category_id.into(),
            transaction_date,
            amount_minor,
            memo: None,
        }
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Allocate budgetable funds to a category envelope for one month.
///
/// With `from_category_id` unset the funds come from Ready-to-Assign.
#[derive(Clone, Debug)]
pub struct AllocationCmd {
    pub to_category_id: String,
    pub from_category_id: Option<String>,
    pub allocation_date: NaiveDate,
    /// Budget month to credit; defaults to the allocation date's month.
    pub month_start: Option<NaiveDate>,
    pub amount_minor: i64,
    pub memo: Option<String>,
}

impl AllocationCmd {
    #[must_use]
    pub fn new(
        to_category_id: impl Into<String>,
        allocation_date: NaiveDate,
        amount_minor: i64,
    ) -> Self {
        Self {
            to_category_id: to_category_id.into(),
            from_category_id: None,
            allocation_date,
            month_start: None,
            amount_minor,
            memo: None,
        }
    }

    #[must_use]
    pub fn from_category_id(mut self, from_category_id: impl Into<String>) -> Self {
        self.from_category_id = Some(from_category_id.into());
        self
    }

    #[must_use]
    pub fn month_start(mut self, month_start: NaiveDate) -> Self {
        self.month_start = Some(month_start);
        self
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Register a new account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub account_id: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_class: AccountClass,
    pub account_role: AccountRole,
    pub currency: String,
    pub opened_on: Option<NaiveDate>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        account_class: AccountClass,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            name: name.into(),
            account_type,
            account_class,
            account_role: AccountRole::OnBudget,
            currency: "EUR".to_string(),
            opened_on: None,
        }
    }

    #[must_use]
    pub fn account_role(mut self, account_role: AccountRole) -> Self {
        self.account_role = account_role;
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    #[must_use]
    pub fn opened_on(mut self, opened_on: NaiveDate) -> Self {
        self.opened_on = Some(opened_on);
        self
    }
}

/// Partial update of an account; unset fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct UpdateAccountCmd {
    pub name: Option<String>,
    pub account_role: Option<AccountRole>,
    pub is_active: Option<bool>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn account_role(mut self, account_role: AccountRole) -> Self {
        self.account_role = Some(account_role);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Register a new budget category.
#[derive(Clone, Debug)]
pub struct NewCategoryCmd {
    pub category_id: String,
    pub name: String,
    pub group_id: Option<String>,
    pub goal: Option<CategoryGoal>,
}

impl NewCategoryCmd {
    #[must_use]
    pub fn new(category_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            name: name.into(),
            group_id: None,
            goal: None,
        }
    }

    #[must_use]
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn goal(mut self, goal: CategoryGoal) -> Self {
        self.goal = Some(goal);
        self
    }
}

/// Partial update of a budget category; unset fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct UpdateCategoryCmd {
    pub name: Option<String>,
    pub group_id: Option<Option<String>>,
    pub goal: Option<Option<CategoryGoal>>,
    pub is_active: Option<bool>,
}

impl UpdateCategoryCmd {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn group_id(mut self, group_id: Option<String>) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn goal(mut self, goal: Option<CategoryGoal>) -> Self {
        self.goal = Some(goal);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// Register a new category group.
#[derive(Clone, Debug)]
pub struct NewGroupCmd {
    pub group_id: String,
    pub name: String,
    pub sort_order: i32,
}

impl NewGroupCmd {
    #[must_use]
    pub fn new(group_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            sort_order: 0,
        }
    }

    #[must_use]
    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Record a reconciliation checkpoint for an account.
#[derive(Clone, Debug)]
pub struct CheckpointCmd {
    pub account_id: String,
    pub statement_date: NaiveDate,
    pub statement_balance_minor: i64,
    pub statement_pending_total_minor: i64,
}

impl CheckpointCmd {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        statement_date: NaiveDate,
        statement_balance_minor: i64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            statement_date,
            statement_balance_minor,
            statement_pending_total_minor: 0,
        }
    }

    #[must_use]
    pub fn statement_pending_total_minor(mut self, total_minor: i64) -> Self {
        self.statement_pending_total_minor = total_minor;
        self
    }
}
