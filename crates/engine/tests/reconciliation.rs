use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountClass, AccountType, Engine, EngineError, FixedClock, TransactionStatus,
    commands::{CheckpointCmd, NewAccountCmd, NewCategoryCmd, NewTransactionCmd},
};
use migration::MigratorTrait;

fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

fn at(year: i32, month: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, hour, 0, 0).unwrap()
}

/// One engine per instant; reconciliation cutoffs compare wall-clock times.
async fn engine_at(db: &DatabaseConnection, instant: DateTime<Utc>) -> Engine {
    Engine::builder()
        .database(db.clone())
        .clock(Arc::new(FixedClock::new(instant)))
        .build()
        .await
        .unwrap()
}

async fn db_with_account() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = engine_at(&db, at(2025, 2, 1, 8)).await;
    engine
        .create_account(NewAccountCmd::new(
            "checking",
            "Checking",
            AccountType::Asset,
            AccountClass::Cash,
        ))
        .await
        .unwrap();
    engine
        .create_category(NewCategoryCmd::new("groceries", "Groceries"))
        .await
        .unwrap();
    db
}

#[tokio::test]
async fn checkpoints_chain_through_previous_ids() {
    let db = db_with_account().await;

    let first = engine_at(&db, at(2025, 2, 5, 9))
        .await
        .create_checkpoint(CheckpointCmd::new("checking", day(2025, 2, 4), 150_000))
        .await
        .unwrap();
    assert!(first.previous_reconciliation_id.is_none());
    assert_eq!(first.statement_balance_minor, 150_000);
    assert_eq!(first.statement_pending_total_minor, 0);

    let second = engine_at(&db, at(2025, 3, 5, 9))
        .await
        .create_checkpoint(
            CheckpointCmd::new("checking", day(2025, 3, 4), 140_000)
                .statement_pending_total_minor(-2_500),
        )
        .await
        .unwrap();
    assert_eq!(
        second.previous_reconciliation_id,
        Some(first.reconciliation_id)
    );
    assert_eq!(second.statement_pending_total_minor, -2_500);

    let latest = engine_at(&db, at(2025, 3, 6, 9))
        .await
        .latest_checkpoint("checking")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.reconciliation_id, second.reconciliation_id);
}

#[tokio::test]
async fn checkpoint_requires_an_active_account() {
    let db = db_with_account().await;
    let engine = engine_at(&db, at(2025, 2, 5, 9)).await;

    let err = engine
        .create_checkpoint(CheckpointCmd::new("missing", day(2025, 2, 4), 0))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AccountNotFound("missing".to_string()));
}

#[tokio::test]
async fn worksheet_lists_new_and_pending_activity_only() {
    let db = db_with_account().await;

    // Cleared before the checkpoint: should drop off the worksheet.
    engine_at(&db, at(2025, 2, 3, 10))
        .await
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "groceries",
            day(2025, 2, 3),
            -1_000,
        ))
        .await
        .unwrap();
    // Pending before the checkpoint: stays on the worksheet.
    engine_at(&db, at(2025, 2, 4, 10))
        .await
        .create_transaction(
            NewTransactionCmd::new("checking", "groceries", day(2025, 2, 4), -2_000)
                .status(TransactionStatus::Pending),
        )
        .await
        .unwrap();

    engine_at(&db, at(2025, 2, 5, 9))
        .await
        .create_checkpoint(CheckpointCmd::new("checking", day(2025, 2, 4), -1_000))
        .await
        .unwrap();

    // Recorded after the checkpoint.
    engine_at(&db, at(2025, 2, 6, 10))
        .await
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "groceries",
            day(2025, 2, 6),
            -3_000,
        ))
        .await
        .unwrap();

    let worksheet = engine_at(&db, at(2025, 2, 7, 9))
        .await
        .reconciliation_worksheet("checking")
        .await
        .unwrap();

    let amounts: Vec<i64> = worksheet.iter().map(|e| e.amount_minor).collect();
    assert_eq!(amounts, vec![-2_000, -3_000]);
    assert_eq!(worksheet[0].status, TransactionStatus::Pending);
    assert_eq!(worksheet[0].category_name, "Groceries");
    assert_eq!(worksheet[0].account_name, "Checking");
}

#[tokio::test]
async fn worksheet_without_checkpoint_covers_all_activity() {
    let db = db_with_account().await;

    engine_at(&db, at(2025, 2, 3, 10))
        .await
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "groceries",
            day(2025, 2, 3),
            -1_000,
        ))
        .await
        .unwrap();

    let worksheet = engine_at(&db, at(2025, 2, 4, 9))
        .await
        .reconciliation_worksheet("checking")
        .await
        .unwrap();
    assert_eq!(worksheet.len(), 1);

    let err = engine_at(&db, at(2025, 2, 4, 9))
        .await
        .reconciliation_worksheet("missing")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AccountNotFound("missing".to_string()));
}
