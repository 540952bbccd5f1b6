use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;

use std::sync::Arc;

use crate::{accounts, allocations, categories, reconciliation, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/accounts/{account_id}",
            get(accounts::get_one).patch(accounts::update),
        )
        .route(
            "/accounts/{account_id}/reconciliations",
            get(reconciliation::latest).post(reconciliation::create),
        )
        .route(
            "/accounts/{account_id}/reconciliations/worksheet",
            get(reconciliation::worksheet),
        )
        .route("/groups", get(categories::list_groups).post(categories::create_group))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{category_id}",
            get(categories::get_one).patch(categories::update),
        )
        .route("/budget/month", get(categories::month_overview))
        .route("/budget/readyToAssign", get(allocations::ready_to_assign))
        .route(
            "/budget/allocations",
            get(allocations::list).post(allocations::create),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/{concept_id}", get(transactions::history))
        .route(
            "/transactions/{concept_id}/void",
            post(transactions::void_tx),
        )
        .route("/transfers", post(transactions::transfer))
        .route("/admin/rebuildCaches", post(admin_rebuild))
        .with_state(state)
}

async fn admin_rebuild(
    axum::extract::State(state): axum::extract::State<ServerState>,
) -> Result<axum::Json<engine::RebuildSummary>, crate::ServerError> {
    let summary = state.engine.rebuild_caches().await?;
    Ok(axum::Json(summary))
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
