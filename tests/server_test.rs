// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Integration tests for a REST front over the engine with concurrent
//! requests, verifying the ledger stays consistent under HTTP-level load.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use shift_ledger_rs::{
    AccountId, ActorId, Authorizer, ErrorKind, Ledger, LedgerError, NewClient, NewOrder,
    NewTransaction, OrderId, ShiftSummary, TransactionKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;

// === DTOs (duplicated from the demo for test isolation) ===

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaymentRequest {
    actor: u32,
    bank_account: u32,
    order: u32,
    amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CloseRequest {
    actor: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct DebtResponse {
    debt: Decimal,
}

#[derive(Clone)]
struct AppState {
    ledger: Arc<Ledger>,
}

struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Integrity => StatusCode::CONFLICT,
        };
        (status, self.0.to_string()).into_response()
    }
}

async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<StatusCode, AppError> {
    state.ledger.create_transaction(
        ActorId(request.actor),
        NewTransaction::new(TransactionKind::OrderPayment, request.amount)
            .on_account(AccountId(request.bank_account))
            .for_order(OrderId(request.order)),
    )?;
    Ok(StatusCode::CREATED)
}

async fn close_shift(
    State(state): State<AppState>,
    Json(request): Json<CloseRequest>,
) -> Result<Json<ShiftSummary>, AppError> {
    let summary = state.ledger.close_shift(ActorId(request.actor))?;
    Ok(Json(summary))
}

async fn order_debt(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<DebtResponse>, AppError> {
    let debt = state.ledger.order_debt(OrderId(id))?;
    Ok(Json(DebtResponse { debt }))
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/shift/close", post(close_shift))
        .route("/orders/{id}/debt", get(order_debt))
        .with_state(state)
}

// === Test Setup ===

/// Builds a ledger with one account and a large order, serves it on an
/// ephemeral port, and returns the base URL.
async fn spawn_server(order_amount: Decimal) -> (String, Arc<Ledger>) {
    let auth = Arc::new(Authorizer::new());
    let ledger = Arc::new(Ledger::new(Arc::clone(&auth)));
    auth.grant_all(ActorId(1));

    ledger.create_account("Cash", None).unwrap();
    let client = ledger.create_client(NewClient::named("Acme")).unwrap();
    ledger
        .create_order(NewOrder {
            client: client.id,
            product: "signage".into(),
            manager: Some(ActorId(1)),
            amount: order_amount,
            status: "new".into(),
        })
        .unwrap();

    let state = AppState {
        ledger: Arc::clone(&ledger),
    };
    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), ledger)
}

// === Tests ===

#[tokio::test]
async fn payment_then_close_over_http() {
    let (base, ledger) = spawn_server(dec!(1000.00)).await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/payments"))
        .json(&PaymentRequest {
            actor: 1,
            bank_account: 1,
            order: 1,
            amount: dec!(400.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let debt: DebtResponse = client
        .get(format!("{base}/orders/1/debt"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(debt.debt, dec!(600.00));

    let response = client
        .post(format!("{base}/shift/close"))
        .json(&CloseRequest { actor: 1 })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let summary: ShiftSummary = response.json().await.unwrap();
    assert_eq!(summary.transactions_closed, 1);

    assert_eq!(ledger.order(OrderId(1)).unwrap().paid_amount, dec!(400.00));
}

#[tokio::test]
async fn over_payment_is_rejected_with_400() {
    let (base, ledger) = spawn_server(dec!(100.00)).await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/payments"))
        .json(&PaymentRequest {
            actor: 1,
            bank_account: 1,
            order: 1,
            amount: dec!(150.00),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(ledger.current_shift(ActorId(1)).transactions.is_empty());
}

#[tokio::test]
async fn missing_order_is_rejected_with_404() {
    let (base, _ledger) = spawn_server(dec!(100.00)).await;
    let client = Client::new();

    let response = client
        .get(format!("{base}/orders/99/debt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn close_without_capability_is_403() {
    let (base, _ledger) = spawn_server(dec!(100.00)).await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/shift/close"))
        .json(&CloseRequest { actor: 9 })
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

/// Hundreds of concurrent payments all land, and one close folds exactly
/// their sum into the account balance.
#[tokio::test]
async fn concurrent_payments_stay_consistent() {
    let (base, ledger) = spawn_server(dec!(100000.00)).await;
    let client = Client::new();
    let requests = 200u32;

    let futures: Vec<_> = (0..requests)
        .map(|_| {
            let client = client.clone();
            let url = format!("{base}/payments");
            async move {
                client
                    .post(url)
                    .json(&PaymentRequest {
                        actor: 1,
                        bank_account: 1,
                        order: 1,
                        amount: dec!(1.00),
                    })
                    .send()
                    .await
                    .unwrap()
                    .status()
            }
        })
        .collect();
    let statuses = futures::future::join_all(futures).await;
    assert!(statuses.iter().all(|status| *status == 201));

    let debt: DebtResponse = client
        .get(format!("{base}/orders/1/debt"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(debt.debt, dec!(100000.00) - Decimal::from(requests));

    let response = client
        .post(format!("{base}/shift/close"))
        .json(&CloseRequest { actor: 1 })
        .send()
        .await
        .unwrap();
    let summary: ShiftSummary = response.json().await.unwrap();
    assert_eq!(summary.transactions_closed, requests as usize);

    assert_eq!(
        ledger.account(AccountId(1)).unwrap().balance,
        Decimal::from(requests)
    );
}
