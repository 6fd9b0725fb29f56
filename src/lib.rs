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

//! # Shift Ledger
//!
//! This library provides a ledger reconciliation engine for a business that
//! settles its books in shifts. Transactions are created pending, balances
//! and debts are answered live by combining cached fields with the pending
//! log, and closing a shift atomically folds every pending row into the
//! cached account, order and client balances.
//!
//! ## Core Components
//!
//! - [`Ledger`]: the engine holding accounts, clients, orders and the
//!   transaction log
//! - [`Transaction`] / [`TransactionKind`]: the append-only log rows
//! - [`Transfer`]: an account-to-account transfer owning its two legs
//! - [`Authorizer`] / [`Capability`]: per-actor permission snapshots
//! - [`CurrencyFormat`]: explicit formatting for presentation boundaries
//! - [`LedgerError`]: error types with a coarse [`ErrorKind`] taxonomy
//!
//! ## Example
//!
//! ```
//! use shift_ledger_rs::{
//!     ActorId, Authorizer, Ledger, NewClient, NewOrder, NewTransaction, TransactionKind,
//! };
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let auth = Arc::new(Authorizer::new());
//! let actor = ActorId(1);
//! auth.grant_all(actor);
//!
//! let ledger = Ledger::new(Arc::clone(&auth));
//! let cash = ledger.create_account("Cash desk", None).unwrap();
//! let client = ledger.create_client(NewClient::named("Acme")).unwrap();
//! let order = ledger
//!     .create_order(NewOrder {
//!         client: client.id,
//!         product: "signage".into(),
//!         manager: None,
//!         amount: dec!(1000.00),
//!         status: "new".into(),
//!     })
//!     .unwrap();
//!
//! // A payment stays pending until the shift is closed.
//! ledger
//!     .create_transaction(
//!         actor,
//!         NewTransaction::new(TransactionKind::OrderPayment, dec!(400.00))
//!             .on_account(cash.id)
//!             .for_order(order.id),
//!     )
//!     .unwrap();
//! assert_eq!(ledger.order_debt(order.id).unwrap(), dec!(600.00));
//!
//! // Closing folds it into the cached balances.
//! ledger.close_shift(actor).unwrap();
//! assert_eq!(ledger.order(order.id).unwrap().paid_amount, dec!(400.00));
//! assert_eq!(ledger.order_debt(order.id).unwrap(), dec!(600.00));
//! ```
//!
//! ## Thread Safety
//!
//! The engine keeps its state behind a single reader-writer lock: queries
//! run concurrently, mutations are serialized, and a shift close is one
//! exclusive all-or-nothing section, so no pending row can be folded in
//! twice.

pub mod account;
pub mod auth;
mod base;
pub mod category;
pub mod client;
pub mod currency;
pub mod error;
mod ledger;
pub mod order;
mod reconcile;
mod shift;
pub mod transaction;

pub use account::{BankAccount, BankAccountType};
pub use auth::{Authorizer, Capability, CapabilitySet};
pub use base::{
    AccountId, AccountTypeId, ActorId, CategoryId, ClientId, OrderId, TransactionId, TransferId,
};
pub use category::{CategoryKind, TransactionCategory};
pub use client::{Client, NewClient};
pub use currency::CurrencyFormat;
pub use error::{ErrorKind, LedgerError};
pub use ledger::Ledger;
pub use order::{NewOrder, Order};
pub use shift::{AccountGroup, AccountShiftRow, ShiftSummary, ShiftView};
pub use transaction::{
    NewTransaction, Transaction, TransactionKind, TransactionPatch, Transfer, TransferLeg,
};
