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

//! Ledger transactions and transfer pairs.
//!
//! A transaction is created pending (`completed_date` unset) and becomes
//! immutable once a shift close stamps it. Stored amounts are signed:
//! income, order payments and client deposits are positive; expenses and
//! client account payments are negative. Callers always submit positive
//! magnitudes and the ledger applies the sign.

use crate::base::{AccountId, ActorId, CategoryId, ClientId, OrderId, TransactionId, TransferId};
use crate::category::CategoryKind;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kinds of ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Categorized money in.
    Income,
    /// Categorized money out (stored negative).
    Expense,
    /// Payment credited against an order's debt.
    OrderPayment,
    /// One leg of an account-to-account transfer.
    Transfer,
    /// Deposit onto a client's personal account.
    ClientAccountDeposit,
    /// Payment of an order from a client's personal account (stored negative).
    ClientAccountPayment,
}

impl TransactionKind {
    /// The category sign this kind requires, if it requires one at all.
    pub fn category_kind(self) -> Option<CategoryKind> {
        match self {
            Self::Income => Some(CategoryKind::Income),
            Self::Expense => Some(CategoryKind::Expense),
            _ => None,
        }
    }

    /// Whether rows of this kind are stored with a negative amount.
    pub fn is_debit(self) -> bool {
        matches!(self, Self::Expense | Self::ClientAccountPayment)
    }
}

/// One row of the append-only transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub category: Option<CategoryId>,
    pub bank_account: AccountId,
    /// Signed amount as stored; see the module docs for the sign convention.
    pub amount: Decimal,
    pub client: Option<ClientId>,
    pub order: Option<OrderId>,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
    /// Set exactly once, by the shift close that folded this row in.
    pub completed_date: Option<NaiveDate>,
    pub created_by: ActorId,
    /// Present on transfer legs; groups the two rows of a pair.
    pub transfer: Option<TransferId>,
}

impl Transaction {
    /// A row is pending until a shift close completes it.
    pub fn is_pending(&self) -> bool {
        self.completed_date.is_none()
    }
}

/// Input for creating a transaction.
///
/// `amount` is always the positive magnitude; the ledger stores the signed
/// value. Which of the optional references are required depends on the kind.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub bank_account: Option<AccountId>,
    pub category: Option<CategoryId>,
    pub amount: Decimal,
    pub client: Option<ClientId>,
    pub order: Option<OrderId>,
    pub comment: Option<String>,
}

impl NewTransaction {
    pub fn new(kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            kind,
            bank_account: None,
            category: None,
            amount,
            client: None,
            order: None,
            comment: None,
        }
    }

    pub fn on_account(mut self, account: AccountId) -> Self {
        self.bank_account = Some(account);
        self
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn for_client(mut self, client: ClientId) -> Self {
        self.client = Some(client);
        self
    }

    pub fn for_order(mut self, order: OrderId) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Fields that may change on a pending transaction.
///
/// `amount` is a positive magnitude, re-signed per the row's kind. A `None`
/// bank account keeps the current one; client account payments always
/// re-derive theirs from the client's earliest deposit.
#[derive(Debug, Clone)]
pub struct TransactionPatch {
    pub amount: Decimal,
    pub bank_account: Option<AccountId>,
    pub comment: Option<String>,
}

/// One side of a transfer: which account, through which log row.
///
/// The leg records its role in the owning [`Transfer`]; the sign of the row
/// amount is derived from the role, never the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub account: AccountId,
    pub transaction: TransactionId,
}

/// An account-to-account transfer owning its two legs.
///
/// The pair is created, edited and deleted as one unit; the outgoing row
/// carries `-amount`, the incoming row `+amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub outgoing: TransferLeg,
    pub incoming: TransferLeg,
    pub amount: Decimal,
}
