use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountClass, AccountType, CategoryGoal, Engine, EngineError, FixedClock,
    commands::{AllocationCmd, NewAccountCmd, NewCategoryCmd, NewTransactionCmd, UpdateCategoryCmd},
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

async fn seed_budget(engine: &Engine) {
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
        .create_category(NewCategoryCmd::new("housing", "Housing"))
        .await
        .unwrap();
    engine
        .create_category(NewCategoryCmd::new("groceries", "Groceries"))
        .await
        .unwrap();
}

async fn deposit(engine: &Engine, date: NaiveDate, amount_minor: i64) {
    engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "available_to_budget",
            date,
            amount_minor,
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn allocation_from_rta_funds_the_envelope() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 300_000).await;

    let state = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 150_000))
        .await
        .unwrap();

    assert_eq!(state.allocated_minor, 150_000);
    assert_eq!(state.available_minor, 150_000);
    assert_eq!(
        engine.ready_to_assign(day(2025, 2, 1)).await.unwrap(),
        150_000
    );
}

#[tokio::test]
async fn allocation_beyond_ready_to_assign_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 10_000).await;

    let err = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 20_000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransaction(
            "Ready-to-Assign is insufficient for this allocation.".to_string()
        )
    );
}

#[tokio::test]
async fn zero_sum_reallocation_between_envelopes() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 100_000).await;
    engine
        .allocate(AllocationCmd::new("groceries", day(2025, 2, 3), 50_000))
        .await
        .unwrap();

    let housing = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 4), 20_000).from_category_id("groceries"))
        .await
        .unwrap();

    assert_eq!(housing.available_minor, 20_000);
    let groceries = engine
        .category_month_state("groceries", day(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(groceries.available_minor, 30_000);
    // Envelope-to-envelope moves never touch Ready-to-Assign.
    assert_eq!(
        engine.ready_to_assign(day(2025, 2, 1)).await.unwrap(),
        50_000
    );
}

#[tokio::test]
async fn reallocation_beyond_source_funds_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 100_000).await;
    engine
        .allocate(AllocationCmd::new("groceries", day(2025, 2, 3), 10_000))
        .await
        .unwrap();

    let err = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 4), 15_000).from_category_id("groceries"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransaction(
            "Source category does not have enough available funds.".to_string()
        )
    );
}

#[tokio::test]
async fn allocation_validation() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 100_000).await;

    let err = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), -500))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .allocate(AllocationCmd::new(
            "available_to_budget",
            day(2025, 2, 3),
            500,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 500).from_category_id("housing"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));

    let err = engine
        .allocate(AllocationCmd::new("vacation", day(2025, 2, 3), 500))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownCategory("vacation".to_string()));
}

#[tokio::test]
async fn available_rolls_over_into_unmaterialized_months() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 100_000).await;
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 40_000))
        .await
        .unwrap();

    // March has no materialized row for either the category or new income.
    let march = engine
        .category_month_state("housing", day(2025, 3, 1))
        .await
        .unwrap();
    assert_eq!(march.allocated_minor, 0);
    assert_eq!(march.available_minor, 40_000);
    assert_eq!(
        engine.ready_to_assign(day(2025, 3, 1)).await.unwrap(),
        60_000
    );
}

#[tokio::test]
async fn cash_equals_ready_to_assign_plus_envelopes() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 2, 1), 250_000).await;
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 3), 90_000))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("groceries", day(2025, 2, 3), 60_000))
        .await
        .unwrap();
    engine
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "groceries",
            day(2025, 2, 10),
            -12_500,
        ))
        .await
        .unwrap();

    let cash = engine
        .get_account("checking")
        .await
        .unwrap()
        .current_balance_minor;
    let rta = engine.ready_to_assign(day(2025, 2, 1)).await.unwrap();
    let envelopes: i64 = engine
        .month_overview(day(2025, 2, 1))
        .await
        .unwrap()
        .iter()
        .map(|detail| detail.state.available_minor)
        .sum();
    assert_eq!(cash, rta + envelopes);
}

#[tokio::test]
async fn allocation_listing_is_filtered_by_month() {
    let (engine, _db) = engine_with_db().await;
    seed_budget(&engine).await;
    deposit(&engine, day(2025, 1, 5), 100_000).await;
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 1, 6), 10_000))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("housing", day(2025, 2, 2), 20_000))
        .await
        .unwrap();

    let january = engine.list_allocations(day(2025, 1, 1), 50).await.unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].amount_minor, 10_000);

    let february = engine.list_allocations(day(2025, 2, 1), 50).await.unwrap();
    assert_eq!(february.len(), 1);
    assert_eq!(february[0].amount_minor, 20_000);
}

#[tokio::test]
async fn category_goal_is_stored_and_clearable() {
    let (engine, _db) = engine_with_db().await;

    let created = engine
        .create_category(NewCategoryCmd::new("vacation", "Vacation").goal(CategoryGoal {
            goal_type: "target_balance".to_string(),
            amount_minor: Some(200_000),
            target_date: Some(day(2025, 12, 1)),
            frequency: None,
        }))
        .await
        .unwrap();
    let goal = created.goal.unwrap();
    assert_eq!(goal.amount_minor, Some(200_000));

    let updated = engine
        .update_category("vacation", UpdateCategoryCmd::default().goal(None))
        .await
        .unwrap();
    assert!(updated.goal.is_none());
}
