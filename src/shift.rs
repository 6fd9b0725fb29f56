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

//! The current shift and its closing.
//!
//! A shift is the set of pending transactions. Closing it folds every
//! pending row into the cached balances and stamps `completed_date`, as one
//! all-or-nothing step under the state write lock:
//!
//! 1. the capability check happens before any state is read;
//! 2. the pending set is selected (scoped to the actor's own rows unless
//!    they may view all);
//! 3. every referenced account, order and client is verified to exist;
//! 4. only then are balances mutated and rows stamped.
//!
//! Concurrent closes serialize on the write lock, so a pending row is folded
//! in exactly once; the loser of the race sees an empty pending set.

use crate::auth::{Capability, CapabilitySet};
use crate::base::{AccountId, ActorId, TransactionId};
use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerState};
use crate::transaction::{Transaction, TransactionKind};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group name for accounts without a type.
const NO_TYPE_GROUP: &str = "No type";

/// Which pending rows an actor sees and closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    All,
    CreatedBy(ActorId),
}

impl Scope {
    fn includes(self, transaction: &Transaction) -> bool {
        match self {
            Scope::All => true,
            Scope::CreatedBy(actor) => transaction.created_by == actor,
        }
    }

    fn for_actor(actor: ActorId, caps: &CapabilitySet) -> Self {
        if caps.allows(Capability::ViewAllShiftTransactions) {
            Scope::All
        } else {
            Scope::CreatedBy(actor)
        }
    }
}

/// One account line of the shift summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountShiftRow {
    pub account: AccountId,
    pub name: String,
    /// Settled balance.
    pub balance: Decimal,
    /// Sum of the account's pending transactions.
    pub shift_amount: Decimal,
    /// `balance + shift_amount`.
    pub total: Decimal,
}

/// Accounts sharing a bank account type, ordered by type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGroup {
    pub type_name: String,
    pub accounts: Vec<AccountShiftRow>,
}

/// The current shift as an actor sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftView {
    pub accounts: Vec<AccountGroup>,
    pub transactions: Vec<Transaction>,
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub closed_on: NaiveDate,
    pub transactions_closed: usize,
    /// Account table after the close; the shift column is zeroed.
    pub accounts: Vec<AccountGroup>,
}

impl Ledger {
    /// The pending transactions and per-account running totals visible to
    /// the actor.
    pub fn current_shift(&self, actor: ActorId) -> ShiftView {
        let caps = self.auth.capabilities(actor);
        let scope = Scope::for_actor(actor, &caps);
        let state = self.state.read();
        ShiftView {
            accounts: state.account_groups(Some(scope)),
            transactions: state
                .transactions
                .values()
                .filter(|t| t.is_pending() && scope.includes(t))
                .cloned()
                .collect(),
        }
    }

    /// Closes the current shift dated today.
    ///
    /// See [`close_shift_on`](Self::close_shift_on).
    pub fn close_shift(&self, actor: ActorId) -> Result<ShiftSummary, LedgerError> {
        self.close_shift_on(actor, Utc::now().date_naive())
    }

    /// Closes the current shift with an explicit completion date.
    ///
    /// Every pending transaction in the actor's scope is folded into the
    /// cached balances: the signed amount onto its bank account, and for the
    /// client/order kinds the magnitude onto `order.paid_amount` and
    /// `client.balance`. The rows are then stamped completed and become
    /// immutable.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Forbidden`] without [`Capability::CloseShift`];
    ///   checked before anything else.
    /// - [`LedgerError::NoPendingTransactions`] when the scoped pending set
    ///   is empty.
    ///
    /// On any error no mutation is visible.
    pub fn close_shift_on(
        &self,
        actor: ActorId,
        date: NaiveDate,
    ) -> Result<ShiftSummary, LedgerError> {
        let caps = self.auth.capabilities(actor);
        if !caps.allows(Capability::CloseShift) {
            return Err(LedgerError::Forbidden);
        }
        let scope = Scope::for_actor(actor, &caps);

        let mut state = self.state.write();
        let pending: Vec<TransactionId> = state
            .transactions
            .values()
            .filter(|t| t.is_pending() && scope.includes(t))
            .map(|t| t.id)
            .collect();
        if pending.is_empty() {
            return Err(LedgerError::NoPendingTransactions);
        }

        state.check_close_references(&pending)?;
        state.apply_pending(&pending, date);

        tracing::info!(%actor, closed = pending.len(), %date, "shift closed");
        Ok(ShiftSummary {
            closed_on: date,
            transactions_closed: pending.len(),
            accounts: state.account_groups(None),
        })
    }
}

impl LedgerState {
    fn shift_amount(&self, account: AccountId, scope: Scope) -> Decimal {
        self.transactions
            .values()
            .filter(|t| t.is_pending() && t.bank_account == account && scope.includes(t))
            .fold(Decimal::ZERO, |sum, t| sum + t.amount)
    }

    /// Account table grouped by type name. `None` renders the settled table
    /// with a zero shift column.
    fn account_groups(&self, pending: Option<Scope>) -> Vec<AccountGroup> {
        let mut groups: BTreeMap<String, Vec<AccountShiftRow>> = BTreeMap::new();
        for account in self.accounts.values() {
            let type_name = account
                .account_type
                .and_then(|id| self.account_types.get(&id))
                .map(|account_type| account_type.name.clone())
                .unwrap_or_else(|| NO_TYPE_GROUP.to_string());
            let shift_amount = match pending {
                Some(scope) => self.shift_amount(account.id, scope),
                None => Decimal::ZERO,
            };
            groups.entry(type_name).or_default().push(AccountShiftRow {
                account: account.id,
                name: account.name.clone(),
                balance: account.balance,
                shift_amount,
                total: account.balance + shift_amount,
            });
        }
        groups
            .into_iter()
            .map(|(type_name, accounts)| AccountGroup {
                type_name,
                accounts,
            })
            .collect()
    }

    /// Everything the close will touch must resolve before anything mutates.
    fn check_close_references(&self, pending: &[TransactionId]) -> Result<(), LedgerError> {
        for id in pending {
            let tx = self
                .transactions
                .get(id)
                .ok_or(LedgerError::TransactionNotFound)?;
            if !self.accounts.contains_key(&tx.bank_account) {
                return Err(LedgerError::AccountNotFound);
            }
            match tx.kind {
                TransactionKind::OrderPayment => {
                    if let Some(order) = tx.order {
                        if !self.orders.contains_key(&order) {
                            return Err(LedgerError::OrderNotFound);
                        }
                    }
                }
                TransactionKind::ClientAccountDeposit => {
                    if let Some(client) = tx.client {
                        if !self.clients.contains_key(&client) {
                            return Err(LedgerError::ClientNotFound);
                        }
                    }
                }
                TransactionKind::ClientAccountPayment => {
                    if let Some(client) = tx.client {
                        if !self.clients.contains_key(&client) {
                            return Err(LedgerError::ClientNotFound);
                        }
                    }
                    if let Some(order) = tx.order {
                        if !self.orders.contains_key(&order) {
                            return Err(LedgerError::OrderNotFound);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Folds the selected rows into cached balances and stamps them.
    ///
    /// No row depends on another's updated value within the pass, so the
    /// order of application does not matter.
    fn apply_pending(&mut self, pending: &[TransactionId], date: NaiveDate) {
        for id in pending {
            let Some(tx) = self.transactions.get(id) else {
                continue;
            };
            let (kind, account_id, amount, client_id, order_id) =
                (tx.kind, tx.bank_account, tx.amount, tx.client, tx.order);

            if let Some(account) = self.accounts.get_mut(&account_id) {
                account.balance += amount;
            }
            match kind {
                TransactionKind::OrderPayment => {
                    if let Some(order) = order_id.and_then(|id| self.orders.get_mut(&id)) {
                        order.paid_amount += amount.abs();
                    }
                }
                TransactionKind::ClientAccountDeposit => {
                    if let Some(client) = client_id.and_then(|id| self.clients.get_mut(&id)) {
                        client.balance += amount.abs();
                    }
                }
                TransactionKind::ClientAccountPayment => {
                    if let Some(client) = client_id.and_then(|id| self.clients.get_mut(&id)) {
                        client.balance -= amount.abs();
                    }
                    if let Some(order) = order_id.and_then(|id| self.orders.get_mut(&id)) {
                        order.paid_amount += amount.abs();
                    }
                }
                _ => {}
            }
            if let Some(tx) = self.transactions.get_mut(id) {
                tx.completed_date = Some(date);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Authorizer, NewClient, NewOrder, NewTransaction};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn operator(auth: &Authorizer) -> ActorId {
        let actor = ActorId(1);
        auth.grant_all(actor);
        actor
    }

    #[test]
    fn close_requires_the_capability_before_anything_else() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        // no pending rows either, but the permission failure wins
        assert_eq!(
            ledger.close_shift(ActorId(9)),
            Err(LedgerError::Forbidden)
        );
    }

    #[test]
    fn close_with_nothing_pending_is_rejected() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        let actor = operator(&auth);
        assert_eq!(
            ledger.close_shift(actor),
            Err(LedgerError::NoPendingTransactions)
        );
    }

    #[test]
    fn close_stamps_the_requested_date() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        let actor = operator(&auth);

        let account = ledger.create_account("Cash", None).unwrap();
        let category = ledger
            .create_category("Sales", crate::CategoryKind::Income)
            .unwrap();
        let tx = ledger
            .create_transaction(
                actor,
                NewTransaction::new(TransactionKind::Income, dec!(10.00))
                    .on_account(account.id)
                    .in_category(category.id),
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let summary = ledger.close_shift_on(actor, date).unwrap();
        assert_eq!(summary.closed_on, date);
        assert_eq!(summary.transactions_closed, 1);
        assert_eq!(
            ledger.transaction(tx.id).unwrap().completed_date,
            Some(date)
        );
    }

    #[test]
    fn shift_view_groups_accounts_by_type() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        let actor = operator(&auth);

        let cash_type = ledger.create_account_type("Cash desks").unwrap();
        let desk = ledger.create_account("Front desk", Some(cash_type.id)).unwrap();
        let untyped = ledger.create_account("Safe", None).unwrap();
        let category = ledger
            .create_category("Sales", crate::CategoryKind::Income)
            .unwrap();
        ledger
            .create_transaction(
                actor,
                NewTransaction::new(TransactionKind::Income, dec!(75.00))
                    .on_account(desk.id)
                    .in_category(category.id),
            )
            .unwrap();

        let view = ledger.current_shift(actor);
        assert_eq!(view.transactions.len(), 1);
        assert_eq!(view.accounts.len(), 2);

        let cash_group = view
            .accounts
            .iter()
            .find(|g| g.type_name == "Cash desks")
            .unwrap();
        assert_eq!(cash_group.accounts.len(), 1);
        assert_eq!(cash_group.accounts[0].shift_amount, dec!(75.00));
        assert_eq!(cash_group.accounts[0].total, dec!(75.00));

        let untyped_group = view
            .accounts
            .iter()
            .find(|g| g.type_name == NO_TYPE_GROUP)
            .unwrap();
        assert_eq!(untyped_group.accounts[0].account, untyped.id);
        assert_eq!(untyped_group.accounts[0].shift_amount, dec!(0));
    }

    #[test]
    fn scoped_actor_sees_and_closes_only_their_own_rows() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        let supervisor = operator(&auth);
        let cashier = ActorId(2);
        auth.grant(cashier, Capability::CloseShift);

        let account = ledger.create_account("Cash", None).unwrap();
        let category = ledger
            .create_category("Sales", crate::CategoryKind::Income)
            .unwrap();
        ledger
            .create_transaction(
                supervisor,
                NewTransaction::new(TransactionKind::Income, dec!(100.00))
                    .on_account(account.id)
                    .in_category(category.id),
            )
            .unwrap();
        ledger
            .create_transaction(
                cashier,
                NewTransaction::new(TransactionKind::Income, dec!(40.00))
                    .on_account(account.id)
                    .in_category(category.id),
            )
            .unwrap();

        let cashier_view = ledger.current_shift(cashier);
        assert_eq!(cashier_view.transactions.len(), 1);
        assert_eq!(cashier_view.transactions[0].amount, dec!(40.00));

        let summary = ledger.close_shift(cashier).unwrap();
        assert_eq!(summary.transactions_closed, 1);
        assert_eq!(ledger.account(account.id).unwrap().balance, dec!(40.00));

        // the supervisor's row is still pending
        let supervisor_view = ledger.current_shift(supervisor);
        assert_eq!(supervisor_view.transactions.len(), 1);
        assert_eq!(supervisor_view.transactions[0].amount, dec!(100.00));
    }

    #[test]
    fn deposit_then_client_order_cycle_settles_every_cache() {
        let auth = Arc::new(Authorizer::new());
        let ledger = Ledger::new(Arc::clone(&auth));
        let actor = operator(&auth);

        let account = ledger.create_account("Cash", None).unwrap();
        let client = ledger.create_client(NewClient::named("Acme")).unwrap();
        let order = ledger
            .create_order(NewOrder {
                client: client.id,
                product: "signage".into(),
                manager: None,
                amount: dec!(300.00),
                status: "new".into(),
            })
            .unwrap();

        ledger
            .create_transaction(
                actor,
                NewTransaction::new(TransactionKind::ClientAccountDeposit, dec!(500.00))
                    .on_account(account.id)
                    .for_client(client.id),
            )
            .unwrap();
        ledger.close_shift(actor).unwrap();
        assert_eq!(ledger.client(client.id).unwrap().balance, dec!(500.00));
        assert_eq!(ledger.account(account.id).unwrap().balance, dec!(500.00));

        ledger
            .create_transaction(
                actor,
                NewTransaction::new(TransactionKind::ClientAccountPayment, dec!(300.00))
                    .for_client(client.id)
                    .for_order(order.id),
            )
            .unwrap();
        ledger.close_shift(actor).unwrap();

        assert_eq!(ledger.client(client.id).unwrap().balance, dec!(200.00));
        assert_eq!(ledger.order(order.id).unwrap().paid_amount, dec!(300.00));
        // the payment row is negative, so the deposit account gives it back
        assert_eq!(ledger.account(account.id).unwrap().balance, dec!(200.00));
    }
}
