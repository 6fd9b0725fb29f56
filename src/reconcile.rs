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

//! Debt and balance reconciliation.
//!
//! These queries combine a cached field (`order.paid_amount`,
//! `client.balance`, `account.balance`) with a live aggregation over the
//! not-yet-completed part of the transaction log. Every aggregation folds
//! from [`Decimal::ZERO`], so an empty pending set contributes exactly zero.
//!
//! Two debt formulas coexist on purpose. Order payments are validated
//! against [`order_debt`](crate::Ledger::order_debt), which scopes the log
//! to pending rows and counts `paid_amount`. Client account payments are
//! validated against the settled debt, which nets order payments against
//! client account payments across the order's full history and ignores
//! `paid_amount`. The bookkeeping the business ran on behaves this way, so
//! both call sites are kept as they are.

use crate::base::{AccountId, ClientId, OrderId};
use crate::client::Client;
use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerState};
use crate::order::Order;
use crate::transaction::TransactionKind;
use rust_decimal::Decimal;

impl Ledger {
    /// Outstanding debt of an order.
    ///
    /// `order.amount − order.paid_amount − pending credit`, where the
    /// pending credit nets order payments against client account payments
    /// still in the current shift. Zero pending rows means the debt is
    /// exactly `amount − paid_amount`.
    pub fn order_debt(&self, order: OrderId) -> Result<Decimal, LedgerError> {
        let state = self.state.read();
        let order = state.orders.get(&order).ok_or(LedgerError::OrderNotFound)?;
        Ok(state.order_debt_of(order))
    }

    /// Available personal-account balance of a client.
    ///
    /// `client.balance + pending deposits + pending payments`; payment rows
    /// are stored negative, so they subtract themselves. With nothing
    /// pending this is exactly the cached balance.
    pub fn client_balance(&self, client: ClientId) -> Result<Decimal, LedgerError> {
        let state = self.state.read();
        let client = state
            .clients
            .get(&client)
            .ok_or(LedgerError::ClientNotFound)?;
        Ok(state.client_balance_of(client))
    }
}

impl LedgerState {
    /// Net amount credited toward an order by pending rows.
    ///
    /// Client account payment rows are stored negative, so subtracting them
    /// adds their magnitude to the credit.
    pub(crate) fn pending_order_credit(&self, order: OrderId) -> Decimal {
        self.transactions
            .values()
            .filter(|t| t.is_pending() && t.order == Some(order))
            .fold(Decimal::ZERO, |credit, t| match t.kind {
                TransactionKind::OrderPayment => credit + t.amount,
                TransactionKind::ClientAccountPayment => credit - t.amount,
                _ => credit,
            })
    }

    pub(crate) fn order_debt_of(&self, order: &Order) -> Decimal {
        order.amount - order.paid_amount - self.pending_order_credit(order.id)
    }

    /// Debt netted over the order's full history, ignoring `paid_amount`.
    /// Used to bound client account payments.
    pub(crate) fn settled_order_debt_of(&self, order: &Order) -> Decimal {
        let credited = self
            .transactions
            .values()
            .filter(|t| t.order == Some(order.id))
            .fold(Decimal::ZERO, |credit, t| match t.kind {
                TransactionKind::OrderPayment => credit + t.amount,
                TransactionKind::ClientAccountPayment => credit - t.amount,
                _ => credit,
            });
        order.amount - credited
    }

    /// Signed sum of a client's pending deposits and payments.
    pub(crate) fn pending_client_delta(&self, client: ClientId) -> Decimal {
        self.transactions
            .values()
            .filter(|t| t.is_pending() && t.client == Some(client))
            .filter(|t| {
                matches!(
                    t.kind,
                    TransactionKind::ClientAccountDeposit | TransactionKind::ClientAccountPayment
                )
            })
            .fold(Decimal::ZERO, |sum, t| sum + t.amount)
    }

    pub(crate) fn client_balance_of(&self, client: &Client) -> Decimal {
        client.balance + self.pending_client_delta(client.id)
    }

    /// Bank account a client account payment settles against: the account of
    /// the client's earliest deposit, else the lowest-id account.
    pub(crate) fn deposit_account_for(&self, client: ClientId) -> Option<AccountId> {
        self.transactions
            .values()
            .find(|t| t.kind == TransactionKind::ClientAccountDeposit && t.client == Some(client))
            .map(|t| t.bank_account)
            .or_else(|| self.accounts.keys().next().copied())
    }
}
