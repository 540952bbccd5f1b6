use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountClass, AccountType, Engine, EngineError, FixedClock, derive_payment_category_id,
    commands::{AllocationCmd, NewAccountCmd, NewCategoryCmd, NewTransactionCmd},
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

async fn seed_card_budget(engine: &Engine) {
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
        .create_transaction(NewTransactionCmd::new(
            "checking",
            "available_to_budget",
            day(2025, 2, 1),
            300_000,
        ))
        .await
        .unwrap();
    engine
        .allocate(AllocationCmd::new("groceries", day(2025, 2, 2), 20_000))
        .await
        .unwrap();
}

#[tokio::test]
async fn credit_account_creation_provisions_a_payment_envelope() {
    let (engine, _db) = engine_with_db().await;
    seed_card_budget(&engine).await;

    let payment_id = derive_payment_category_id("visa");
    assert_eq!(payment_id, "payment_visa");
    let category = engine.get_category(&payment_id).await.unwrap();
    assert!(!category.is_system);
    assert_eq!(category.group_id.as_deref(), Some("credit_card_payments"));

    let groups = engine.list_groups().await.unwrap();
    assert!(groups.iter().any(|g| g.group_id == "credit_card_payments"));
}

#[tokio::test]
async fn card_spending_shifts_funds_into_the_payment_envelope() {
    let (engine, _db) = engine_with_db().await;
    seed_card_budget(&engine).await;

    let outcome = engine
        .create_transaction(NewTransactionCmd::new(
            "visa",
            "groceries",
            day(2025, 2, 10),
            -8_000,
        ))
        .await
        .unwrap();

    assert_eq!(outcome.account_balance_minor, -8_000);
    let groceries = outcome.category_month.unwrap();
    assert_eq!(groceries.available_minor, 12_000);

    let payment = engine
        .category_month_state("payment_visa", day(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(payment.inflow_minor, 8_000);
    assert_eq!(payment.available_minor, 8_000);

    // The reserve move is budget-internal.
    assert_eq!(
        engine.ready_to_assign(day(2025, 2, 1)).await.unwrap(),
        280_000
    );
}

#[tokio::test]
async fn card_refund_releases_the_reserve() {
    let (engine, _db) = engine_with_db().await;
    seed_card_budget(&engine).await;

    engine
        .create_transaction(NewTransactionCmd::new(
            "visa",
            "groceries",
            day(2025, 2, 10),
            -8_000,
        ))
        .await
        .unwrap();
    engine
        .create_transaction(NewTransactionCmd::new(
            "visa",
            "groceries",
            day(2025, 2, 12),
            3_000,
        ))
        .await
        .unwrap();

    let payment = engine
        .category_month_state("payment_visa", day(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(payment.available_minor, 5_000);
    let groceries = engine
        .category_month_state("groceries", day(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(groceries.available_minor, 15_000);
}

#[tokio::test]
async fn voiding_a_card_charge_unwinds_the_reserve() {
    let (engine, _db) = engine_with_db().await;
    seed_card_budget(&engine).await;

    let charge = engine
        .create_transaction(NewTransactionCmd::new(
            "visa",
            "groceries",
            day(2025, 2, 10),
            -8_000,
        ))
        .await
        .unwrap();
    engine
        .void_transaction(charge.version.concept_id)
        .await
        .unwrap();

    let payment = engine
        .category_month_state("payment_visa", day(2025, 2, 1))
        .await
        .unwrap();
    assert_eq!(payment.available_minor, 0);
    assert_eq!(
        engine
            .get_account("visa")
            .await
            .unwrap()
            .current_balance_minor,
        0
    );
}

#[tokio::test]
async fn payment_prefix_is_reserved_for_provisioned_categories() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_category(NewCategoryCmd::new("payment_visa", "Visa Payment"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransaction(_)));
}

#[tokio::test]
async fn duplicate_identifiers_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    seed_card_budget(&engine).await;

    let err = engine
        .create_account(NewAccountCmd::new(
            "checking",
            "Checking Again",
            AccountType::Asset,
            AccountClass::Cash,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)));

    let err = engine
        .create_category(NewCategoryCmd::new("groceries", "Groceries Again"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists(_)));
}
