//! Simple REST API server example for the shift ledger engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /transactions` - Create a pending transaction
//! - `POST /transfers` - Create a transfer pair between two accounts
//! - `POST /shift/close` - Close the current shift
//! - `GET /shift` - Current shift view (accounts and pending transactions)
//! - `GET /orders/{id}/debt` - Outstanding debt of an order
//! - `GET /clients/{id}/balance` - Personal account balance of a client
//!
//! ## Example Usage
//!
//! ```bash
//! # Order payment (the demo seeds account 1, client 1 and order 1)
//! curl -X POST http://localhost:3000/transactions \
//!   -H "Content-Type: application/json" \
//!   -d '{"kind": "order_payment", "actor": 1, "bank_account": 1, "order": 1, "amount": "400.00"}'
//!
//! # Outstanding debt
//! curl http://localhost:3000/orders/1/debt
//!
//! # Transfer between the two seeded accounts
//! curl -X POST http://localhost:3000/transfers \
//!   -H "Content-Type: application/json" \
//!   -d '{"actor": 1, "source": 1, "dest": 2, "amount": "50.00"}'
//!
//! # Close the shift
//! curl -X POST http://localhost:3000/shift/close \
//!   -H "Content-Type: application/json" -d '{"actor": 1}'
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shift_ledger_rs::{
    AccountId, ActorId, Authorizer, CategoryId, CategoryKind, ClientId, CurrencyFormat, ErrorKind,
    Ledger, LedgerError, NewClient, NewOrder, NewTransaction, OrderId, ShiftSummary, ShiftView,
    Transaction, TransactionKind, Transfer,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// === Request/Response DTOs ===

/// Request body for creating transactions.
///
/// ```json
/// {"kind": "order_payment", "actor": 1, "bank_account": 1, "order": 1, "amount": "400.00"}
/// ```
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub actor: u32,
    pub amount: Decimal,
    pub bank_account: Option<u32>,
    pub category: Option<u32>,
    pub client: Option<u32>,
    pub order: Option<u32>,
    pub comment: Option<String>,
}

impl TransactionRequest {
    fn into_new_transaction(self) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            bank_account: self.bank_account.map(AccountId),
            category: self.category.map(CategoryId),
            amount: self.amount,
            client: self.client.map(ClientId),
            order: self.order.map(OrderId),
            comment: self.comment,
        }
    }
}

/// Request body for creating and updating transfers.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub actor: u32,
    pub source: u32,
    pub dest: u32,
    pub amount: Decimal,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseShiftRequest {
    pub actor: u32,
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor: u32,
}

/// Response body for debt and balance queries.
#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub amount: Decimal,
    pub formatted: String,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger engine.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub format: CurrencyFormat,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match self.0.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::Integrity => (StatusCode::CONFLICT, "INTEGRITY"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /transactions - Create a pending transaction.
async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let actor = ActorId(request.actor);
    let tx = state
        .ledger
        .create_transaction(actor, request.into_new_transaction())?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// POST /transfers - Create a transfer pair.
async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<Transfer>), AppError> {
    let transfer = state.ledger.create_transfer(
        ActorId(request.actor),
        AccountId(request.source),
        AccountId(request.dest),
        request.amount,
        request.comment,
    )?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

/// POST /shift/close - Close the current shift.
async fn close_shift(
    State(state): State<AppState>,
    Json(request): Json<CloseShiftRequest>,
) -> Result<Json<ShiftSummary>, AppError> {
    let summary = state.ledger.close_shift(ActorId(request.actor))?;
    Ok(Json(summary))
}

/// GET /shift?actor=1 - Current shift view.
async fn current_shift(
    State(state): State<AppState>,
    Query(query): Query<ActorQuery>,
) -> Json<ShiftView> {
    Json(state.ledger.current_shift(ActorId(query.actor)))
}

/// GET /orders/{id}/debt - Outstanding debt of an order.
async fn order_debt(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<AmountResponse>, AppError> {
    let debt = state.ledger.order_debt(OrderId(id))?;
    Ok(Json(AmountResponse {
        amount: debt,
        formatted: state.format.format(debt),
    }))
}

/// GET /clients/{id}/balance - Personal account balance of a client.
async fn client_balance(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<AmountResponse>, AppError> {
    let balance = state.ledger.client_balance(ClientId(id))?;
    Ok(Json(AmountResponse {
        amount: balance,
        formatted: state.format.format(balance),
    }))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transfers", post(create_transfer))
        .route("/shift/close", post(close_shift))
        .route("/shift", get(current_shift))
        .route("/orders/{id}/debt", get(order_debt))
        .route("/clients/{id}/balance", get(client_balance))
        .with_state(state)
}

// === Seed Data ===

/// A small world to poke at: two accounts, a category, a client, an order,
/// a supervisor (actor 1) and a cashier (actor 2) with no permissions.
fn seed(ledger: &Ledger, auth: &Authorizer) {
    auth.grant_all(ActorId(1));

    let cash_type = ledger
        .create_account_type("Cash desks")
        .expect("seed account type");
    ledger
        .create_account("Front desk", Some(cash_type.id))
        .expect("seed account");
    ledger.create_account("Bank", None).expect("seed account");
    ledger
        .create_category("Sales", CategoryKind::Income)
        .expect("seed category");
    let client = ledger
        .create_client(NewClient::named("Acme"))
        .expect("seed client");
    ledger
        .create_order(NewOrder {
            client: client.id,
            product: "signage".into(),
            manager: Some(ActorId(1)),
            amount: rust_decimal_macros::dec!(1000.00),
            status: "new".into(),
        })
        .expect("seed order");
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let auth = Arc::new(Authorizer::new());
    let ledger = Arc::new(Ledger::new(Arc::clone(&auth)));
    seed(&ledger, &auth);

    let state = AppState {
        ledger,
        format: CurrencyFormat::default(),
    };
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Shift ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /transactions          - Create a pending transaction");
    println!("  POST /transfers             - Create a transfer pair");
    println!("  POST /shift/close           - Close the current shift");
    println!("  GET  /shift?actor=1         - Current shift view");
    println!("  GET  /orders/{{id}}/debt     - Outstanding order debt");
    println!("  GET  /clients/{{id}}/balance - Client account balance");

    axum::serve(listener, app).await.unwrap();
}
