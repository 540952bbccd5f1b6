//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for the budgeting ledger:
//!
//! - `accounts`: asset/liability registers with a cached balance
//! - `budget_category_groups`: display grouping for envelopes
//! - `budget_categories`: envelopes, including seeded system categories
//! - `transactions`: versioned ledger rows (one active version per concept)
//! - `budget_allocations`: append-only envelope funding moves
//! - `budget_category_monthly_state`: per-month envelope aggregate cache
//! - `account_reconciliations`: per-account statement checkpoints

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    AccountId,
    Name,
    AccountType,
    AccountClass,
    AccountRole,
    CurrentBalanceMinor,
    Currency,
    IsActive,
    OpenedOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetCategoryGroups {
    Table,
    GroupId,
    Name,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BudgetCategories {
    Table,
    CategoryId,
    GroupId,
    Name,
    IsActive,
    IsSystem,
    GoalType,
    GoalAmountMinor,
    GoalTargetDate,
    GoalFrequency,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    TransactionVersionId,
    ConceptId,
    AccountId,
    CategoryId,
    TransactionDate,
    AmountMinor,
    Memo,
    Status,
    ValidFrom,
    ValidTo,
    IsActive,
    RecordedAt,
    Source,
}

#[derive(Iden)]
enum BudgetAllocations {
    Table,
    AllocationId,
    AllocationDate,
    MonthStart,
    FromCategoryId,
    ToCategoryId,
    AmountMinor,
    Memo,
    CreatedAt,
}

#[derive(Iden)]
enum BudgetCategoryMonthlyState {
    Table,
    CategoryId,
    MonthStart,
    AllocatedMinor,
    InflowMinor,
    ActivityMinor,
    AvailableMinor,
}

#[derive(Iden)]
enum AccountReconciliations {
    Table,
    ReconciliationId,
    AccountId,
    CreatedAt,
    StatementDate,
    StatementBalanceMinor,
    StatementPendingTotalMinor,
    PreviousReconciliationId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::AccountId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountClass).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountRole).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CurrentBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::OpenedOn).date())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budget Category Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategoryGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategoryGroups::GroupId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetCategoryGroups::Name).string().not_null())
                    .col(
                        ColumnDef::new(BudgetCategoryGroups::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryGroups::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryGroups::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryGroups::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Budget Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategories::CategoryId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetCategories::GroupId).string())
                    .col(ColumnDef::new(BudgetCategories::Name).string().not_null())
                    .col(
                        ColumnDef::new(BudgetCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::IsSystem)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(BudgetCategories::GoalType).string())
                    .col(ColumnDef::new(BudgetCategories::GoalAmountMinor).big_integer())
                    .col(ColumnDef::new(BudgetCategories::GoalTargetDate).date())
                    .col(ColumnDef::new(BudgetCategories::GoalFrequency).string())
                    .col(
                        ColumnDef::new(BudgetCategories::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategories::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_categories-group_id")
                            .from(BudgetCategories::Table, BudgetCategories::GroupId)
                            .to(BudgetCategoryGroups::Table, BudgetCategoryGroups::GroupId),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions (versioned ledger)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::TransactionVersionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::ConceptId).string().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::CategoryId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::TransactionDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Memo).string())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::ValidFrom).timestamp().not_null())
                    .col(ColumnDef::new(Transactions::ValidTo).timestamp().not_null())
                    .col(ColumnDef::new(Transactions::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Transactions::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Source).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-category_id")
                            .from(Transactions::Table, Transactions::CategoryId)
                            .to(BudgetCategories::Table, BudgetCategories::CategoryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-concept_id-is_active")
                    .table(Transactions::Table)
                    .col(Transactions::ConceptId)
                    .col(Transactions::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-category_id-transaction_date")
                    .table(Transactions::Table)
                    .col(Transactions::CategoryId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-recorded_at")
                    .table(Transactions::Table)
                    .col(Transactions::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Budget Allocations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetAllocations::AllocationId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BudgetAllocations::AllocationDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetAllocations::MonthStart)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetAllocations::FromCategoryId).string())
                    .col(
                        ColumnDef::new(BudgetAllocations::ToCategoryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetAllocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BudgetAllocations::Memo).string())
                    .col(
                        ColumnDef::new(BudgetAllocations::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_allocations-to_category_id")
                            .from(BudgetAllocations::Table, BudgetAllocations::ToCategoryId)
                            .to(BudgetCategories::Table, BudgetCategories::CategoryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_allocations-month_start")
                    .table(BudgetAllocations::Table)
                    .col(BudgetAllocations::MonthStart)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Budget Category Monthly State (aggregate cache)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetCategoryMonthlyState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::CategoryId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::MonthStart)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::AllocatedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::InflowMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::ActivityMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BudgetCategoryMonthlyState::AvailableMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(BudgetCategoryMonthlyState::CategoryId)
                            .col(BudgetCategoryMonthlyState::MonthStart),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_category_monthly_state-category_id")
                            .from(
                                BudgetCategoryMonthlyState::Table,
                                BudgetCategoryMonthlyState::CategoryId,
                            )
                            .to(BudgetCategories::Table, BudgetCategories::CategoryId),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Account Reconciliations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AccountReconciliations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountReconciliations::ReconciliationId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountReconciliations::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountReconciliations::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountReconciliations::StatementDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountReconciliations::StatementBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountReconciliations::StatementPendingTotalMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AccountReconciliations::PreviousReconciliationId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_reconciliations-account_id")
                            .from(
                                AccountReconciliations::Table,
                                AccountReconciliations::AccountId,
                            )
                            .to(Accounts::Table, Accounts::AccountId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_reconciliations-account_id-created_at")
                    .table(AccountReconciliations::Table)
                    .col(AccountReconciliations::AccountId)
                    .col(AccountReconciliations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Seed system categories
        // ───────────────────────────────────────────────────────────────────
        for (category_id, name) in [
            ("available_to_budget", "Available to Budget"),
            ("account_transfer", "Account Transfer"),
            ("balance_adjustment", "Balance Adjustment"),
            ("opening_balance", "Opening Balance"),
        ] {
            let insert = Query::insert()
                .into_table(BudgetCategories::Table)
                .columns([
                    BudgetCategories::CategoryId,
                    BudgetCategories::Name,
                    BudgetCategories::IsActive,
                    BudgetCategories::IsSystem,
                    BudgetCategories::CreatedAt,
                    BudgetCategories::UpdatedAt,
                ])
                .values_panic([
                    category_id.into(),
                    name.into(),
                    true.into(),
                    true.into(),
                    Expr::current_timestamp().into(),
                    Expr::current_timestamp().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(AccountReconciliations::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(BudgetCategoryMonthlyState::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetCategoryGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
