use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryOrder, Statement};

use engine::{
    AccountClass, AccountType, Engine, FixedClock, monthly_state,
    commands::{AllocationCmd, NewAccountCmd, NewCategoryCmd, NewTransactionCmd, TransferCmd},
};
use migration::MigratorTrait;

fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap());
    let engine = Engine::builder()
        .database(db.clone())
        .clock(Arc::new(clock))
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn snapshot(
    engine: &Engine,
    db: &DatabaseConnection,
) -> (Vec<(String, i64)>, Vec<monthly_state::Model>) {
    let mut balances: Vec<(String, i64)> = engine
        .list_accounts(true)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.account_id, a.current_balance_minor))
        .collect();
    balances.sort();
    let months = monthly_state::Entity::find()
        .order_by_asc(monthly_state::Column::CategoryId)
        .order_by_asc(monthly_state::Column::MonthStart)
        .all(db)
        .await
        .unwrap();
    (balances, months)
}

async fn build_history(engine: &Engine) {
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
        .create_account(NewAccountCmd::new(
            "savings",
            "Savings",
            AccountType::Asset,
            AccountClass::Cash,
        ))
        .await
        .unwrap();
    engine
        .create_account(NewAccountCmd::new(
            "visa",
            "Visa",
            AccountType::Liability,
            AccountClass::Credit,
        ))
        .await
        .unwrap();
    engine
        .create_category(NewCategoryCmd::new("groceries", "Groceries"))
        .await
        .unwrap();
    engine
        .create_category(NewCategoryCmd::new("housing", "Housing"))
        .await
        .unwrap();

    engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "available_to_budget",
            day(2025, 1, 2),
            400_000,
        ))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("groceries", day(2025, 1, 3), 60_000))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 1, 3), 120_000))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 4), 10_000).from_category_id("groceries"))
        .await
        .unwrap();

    // Cash spending, a card charge, a transfer, an edit and a void.
    engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "housing",
            day(2025, 1, 5),
            -110_000,
        ))
        .await
        .unwrap();
    engine
        .create_transaction(NewTransactionCmd::new(
            "visa",
            "groceries",
            day(2025, 1, 9),
            -7_500,
        ))
        .await
        .unwrap();
    engine
        .transfer(TransferCmd::new(
            "checking",
            "savings",
            "account_transfer",
            day(2025, 1, 20),
            50_000,
        ))
        .await
        .unwrap();
    let edited = engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "groceries",
            day(2025, 2, 6),
            -4_000,
        ))
        .await
        .unwrap();
    engine
        .create_transaction(
            NewTransactionCmd::new("checking", "groceries", day(2025, 2, 6), -4_800)
                .concept_id(edited.version.concept_id),
        )
        .await
        .unwrap();
    let voided = engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "housing",
            day(2025, 2, 7),
            -9_999,
        ))
        .await
        .unwrap();
    engine
        .void_transaction(voided.version.concept_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn rebuild_reproduces_incremental_caches_exactly() {
    let (engine, db) = engine_with_db().await;
    build_history(&engine).await;

    let before = snapshot(&engine, &db).await;
    let summary = engine.rebuild_caches().await.unwrap();
    let after = snapshot(&engine, &db).await;

    assert_eq!(before.0, after.0);
    assert_eq!(before.1, after.1);
    assert_eq!(summary.account_rows, 3);
    assert_eq!(summary.month_rows as usize, after.1.len());
}

#[tokio::test]
async fn rebuild_repairs_corrupted_caches() {
    let (engine, db) = engine_with_db().await;
    build_history(&engine).await;
    let before = snapshot(&engine, &db).await;

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "UPDATE accounts SET current_balance_minor = 12345",
    ))
    .await
    .unwrap();
    db.execute(Statement::from_string(
        backend,
        "UPDATE budget_category_monthly_state SET available_minor = -1",
    ))
    .await
    .unwrap();

    engine.rebuild_caches().await.unwrap();
    let after = snapshot(&engine, &db).await;
    assert_eq!(before.0, after.0);
    assert_eq!(before.1, after.1);
}
