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

//! The ledger engine.
//!
//! [`Ledger`] owns the registries (accounts, categories, clients, orders)
//! and the append-only transaction log. All state lives behind a single
//! [`RwLock`]: every mutating operation validates first and mutates only
//! after nothing can fail, so a request either applies completely or leaves
//! the ledger untouched. The write lock also serializes concurrent shift
//! closes, so no pending row is ever folded in twice.
//!
//! # Example
//!
//! ```
//! use shift_ledger_rs::{ActorId, Authorizer, Ledger, NewTransaction, TransactionKind};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let auth = Arc::new(Authorizer::new());
//! let ledger = Ledger::new(Arc::clone(&auth));
//! let actor = ActorId(1);
//!
//! let cash = ledger.create_account("Cash desk", None).unwrap();
//! let salary = ledger
//!     .create_category("Salary", shift_ledger_rs::CategoryKind::Expense)
//!     .unwrap();
//!
//! let tx = ledger
//!     .create_transaction(
//!         actor,
//!         NewTransaction::new(TransactionKind::Expense, dec!(150.00))
//!             .on_account(cash.id)
//!             .in_category(salary.id),
//!     )
//!     .unwrap();
//! assert_eq!(tx.amount, dec!(-150.00));
//! ```

use crate::account::{BankAccount, BankAccountType};
use crate::auth::{Authorizer, Capability};
use crate::base::{
    AccountId, AccountTypeId, ActorId, CategoryId, ClientId, OrderId, TransactionId, TransferId,
};
use crate::category::{CategoryKind, TransactionCategory};
use crate::client::{Client, NewClient};
use crate::error::LedgerError;
use crate::order::{NewOrder, Order};
use crate::transaction::{
    NewTransaction, Transaction, TransactionKind, TransactionPatch, Transfer, TransferLeg,
};
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The ledger reconciliation engine.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct Ledger {
    pub(crate) auth: Arc<Authorizer>,
    pub(crate) state: RwLock<LedgerState>,
}

/// Everything the engine knows, guarded by one lock.
///
/// Maps are keyed by id and ids grow monotonically, so value iteration is
/// always oldest-first. That ordering is load-bearing for
/// [`deposit_account_for`](LedgerState::deposit_account_for).
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) account_types: BTreeMap<AccountTypeId, BankAccountType>,
    pub(crate) accounts: BTreeMap<AccountId, BankAccount>,
    pub(crate) categories: BTreeMap<CategoryId, TransactionCategory>,
    pub(crate) clients: BTreeMap<ClientId, Client>,
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) transactions: BTreeMap<TransactionId, Transaction>,
    pub(crate) transfers: BTreeMap<TransferId, Transfer>,
    ids: IdAllocator,
}

#[derive(Debug, Default)]
struct IdAllocator {
    account_type: u32,
    account: u32,
    category: u32,
    client: u32,
    order: u32,
    transaction: u32,
    transfer: u32,
}

fn bump(counter: &mut u32) -> u32 {
    *counter += 1;
    *counter
}

fn non_empty(name: String) -> Result<String, LedgerError> {
    if name.trim().is_empty() {
        Err(LedgerError::EmptyName)
    } else {
        Ok(name)
    }
}

fn require_account(state: &LedgerState, account: Option<AccountId>) -> Result<AccountId, LedgerError> {
    let id = account.ok_or(LedgerError::MissingAccount)?;
    if !state.accounts.contains_key(&id) {
        return Err(LedgerError::AccountNotFound);
    }
    Ok(id)
}

impl Ledger {
    pub fn new(auth: Arc<Authorizer>) -> Self {
        Self {
            auth,
            state: RwLock::new(LedgerState::default()),
        }
    }

    // === Bank accounts ===

    pub fn create_account_type(
        &self,
        name: impl Into<String>,
    ) -> Result<BankAccountType, LedgerError> {
        let name = non_empty(name.into())?;
        let mut state = self.state.write();
        let id = AccountTypeId(bump(&mut state.ids.account_type));
        let row = BankAccountType { id, name };
        state.account_types.insert(id, row.clone());
        Ok(row)
    }

    pub fn create_account(
        &self,
        name: impl Into<String>,
        account_type: Option<AccountTypeId>,
    ) -> Result<BankAccount, LedgerError> {
        let name = non_empty(name.into())?;
        let mut state = self.state.write();
        if let Some(type_id) = account_type {
            if !state.account_types.contains_key(&type_id) {
                return Err(LedgerError::AccountTypeNotFound);
            }
        }
        let id = AccountId(bump(&mut state.ids.account));
        let row = BankAccount {
            id,
            name,
            account_type,
            balance: Decimal::ZERO,
        };
        state.accounts.insert(id, row.clone());
        tracing::debug!(account = %id, "bank account created");
        Ok(row)
    }

    /// Replaces an account's name and type; the cached balance is untouched.
    pub fn update_account(
        &self,
        id: AccountId,
        name: impl Into<String>,
        account_type: Option<AccountTypeId>,
    ) -> Result<BankAccount, LedgerError> {
        let name = non_empty(name.into())?;
        let mut state = self.state.write();
        if let Some(type_id) = account_type {
            if !state.account_types.contains_key(&type_id) {
                return Err(LedgerError::AccountTypeNotFound);
            }
        }
        let row = state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound)?;
        row.name = name;
        row.account_type = account_type;
        Ok(row.clone())
    }

    /// # Errors
    ///
    /// [`LedgerError::AccountInUse`] when any transaction, pending or
    /// completed, still references the account.
    pub fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        if !state.accounts.contains_key(&id) {
            return Err(LedgerError::AccountNotFound);
        }
        if state.transactions.values().any(|t| t.bank_account == id) {
            return Err(LedgerError::AccountInUse);
        }
        state.accounts.remove(&id);
        Ok(())
    }

    pub fn account(&self, id: AccountId) -> Result<BankAccount, LedgerError> {
        self.state
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound)
    }

    pub fn accounts(&self) -> Vec<BankAccount> {
        self.state.read().accounts.values().cloned().collect()
    }

    pub fn account_types(&self) -> Vec<BankAccountType> {
        self.state.read().account_types.values().cloned().collect()
    }

    // === Categories ===

    pub fn create_category(
        &self,
        name: impl Into<String>,
        kind: CategoryKind,
    ) -> Result<TransactionCategory, LedgerError> {
        let name = non_empty(name.into())?;
        let mut state = self.state.write();
        let id = CategoryId(bump(&mut state.ids.category));
        let row = TransactionCategory { id, name, kind };
        state.categories.insert(id, row.clone());
        Ok(row)
    }

    pub fn update_category(
        &self,
        id: CategoryId,
        name: impl Into<String>,
        kind: CategoryKind,
    ) -> Result<TransactionCategory, LedgerError> {
        let name = non_empty(name.into())?;
        let mut state = self.state.write();
        let row = state
            .categories
            .get_mut(&id)
            .ok_or(LedgerError::CategoryNotFound)?;
        row.name = name;
        row.kind = kind;
        Ok(row.clone())
    }

    /// # Errors
    ///
    /// [`LedgerError::CategoryInUse`] when any transaction still references
    /// the category.
    pub fn delete_category(&self, id: CategoryId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        if !state.categories.contains_key(&id) {
            return Err(LedgerError::CategoryNotFound);
        }
        if state.transactions.values().any(|t| t.category == Some(id)) {
            return Err(LedgerError::CategoryInUse);
        }
        state.categories.remove(&id);
        Ok(())
    }

    pub fn categories(&self) -> Vec<TransactionCategory> {
        self.state.read().categories.values().cloned().collect()
    }

    // === Clients and orders ===

    pub fn create_client(&self, new: NewClient) -> Result<Client, LedgerError> {
        let name = non_empty(new.name)?;
        let mut state = self.state.write();
        let id = ClientId(bump(&mut state.ids.client));
        let row = Client {
            id,
            name,
            legal_name: new.legal_name,
            inn: new.inn,
            comment: new.comment,
            balance: Decimal::ZERO,
        };
        state.clients.insert(id, row.clone());
        Ok(row)
    }

    pub fn client(&self, id: ClientId) -> Result<Client, LedgerError> {
        self.state
            .read()
            .clients
            .get(&id)
            .cloned()
            .ok_or(LedgerError::ClientNotFound)
    }

    pub fn create_order(&self, new: NewOrder) -> Result<Order, LedgerError> {
        if new.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let mut state = self.state.write();
        if !state.clients.contains_key(&new.client) {
            return Err(LedgerError::ClientNotFound);
        }
        let id = OrderId(bump(&mut state.ids.order));
        let row = Order {
            id,
            client: new.client,
            product: new.product,
            manager: new.manager,
            amount: new.amount,
            paid_amount: Decimal::ZERO,
            status: new.status,
            created: Utc::now(),
        };
        state.orders.insert(id, row.clone());
        Ok(row)
    }

    pub fn order(&self, id: OrderId) -> Result<Order, LedgerError> {
        self.state
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(LedgerError::OrderNotFound)
    }

    // === Transactions ===

    /// Creates a pending transaction.
    ///
    /// The submitted amount is a positive magnitude; the stored row is signed
    /// per kind. Kind-specific rules:
    ///
    /// | Kind | Requirements |
    /// |------|--------------|
    /// | Income / Expense | category of the matching kind, bank account |
    /// | OrderPayment | order; amount must not exceed its outstanding debt |
    /// | ClientAccountDeposit | client, bank account |
    /// | ClientAccountPayment | client and order; amount bounded by the client balance and the order's settled debt; the bank account is derived from the client's earliest deposit |
    /// | Transfer | rejected — use [`create_transfer`](Self::create_transfer) |
    ///
    /// # Errors
    ///
    /// Validation errors listed above, or a `*NotFound` error when a
    /// referenced entity does not exist. Nothing is stored on error.
    pub fn create_transaction(
        &self,
        actor: ActorId,
        new: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        if new.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write();

        if let Some(required) = new.kind.category_kind() {
            let category_id = new.category.ok_or(LedgerError::MissingCategory)?;
            let category = state
                .categories
                .get(&category_id)
                .ok_or(LedgerError::CategoryNotFound)?;
            if category.kind != required {
                return Err(LedgerError::CategoryKindMismatch);
            }
        }

        let (bank_account, client, order) = match new.kind {
            TransactionKind::Transfer => return Err(LedgerError::TransferPairRequired),
            TransactionKind::Income | TransactionKind::Expense => {
                let account = require_account(&state, new.bank_account)?;
                (account, new.client, new.order)
            }
            TransactionKind::OrderPayment => {
                let account = require_account(&state, new.bank_account)?;
                let order_id = new.order.ok_or(LedgerError::MissingOrder)?;
                let order = state
                    .orders
                    .get(&order_id)
                    .ok_or(LedgerError::OrderNotFound)?;
                if new.amount > state.order_debt_of(order) {
                    return Err(LedgerError::AmountExceedsDebt);
                }
                (account, new.client, Some(order_id))
            }
            TransactionKind::ClientAccountDeposit => {
                let account = require_account(&state, new.bank_account)?;
                let client_id = new.client.ok_or(LedgerError::MissingClient)?;
                if !state.clients.contains_key(&client_id) {
                    return Err(LedgerError::ClientNotFound);
                }
                (account, Some(client_id), new.order)
            }
            TransactionKind::ClientAccountPayment => {
                let client_id = new.client.ok_or(LedgerError::MissingClient)?;
                let client = state
                    .clients
                    .get(&client_id)
                    .ok_or(LedgerError::ClientNotFound)?;
                let order_id = new.order.ok_or(LedgerError::MissingOrder)?;
                let order = state
                    .orders
                    .get(&order_id)
                    .ok_or(LedgerError::OrderNotFound)?;
                if new.amount > state.client_balance_of(client) {
                    return Err(LedgerError::InsufficientClientBalance);
                }
                if new.amount > state.settled_order_debt_of(order) {
                    return Err(LedgerError::AmountExceedsDebt);
                }
                let account = state
                    .deposit_account_for(client_id)
                    .ok_or(LedgerError::NoDepositAccount)?;
                (account, Some(client_id), Some(order_id))
            }
        };

        let amount = if new.kind.is_debit() {
            -new.amount
        } else {
            new.amount
        };
        let id = TransactionId(bump(&mut state.ids.transaction));
        let row = Transaction {
            id,
            kind: new.kind,
            category: new.category,
            bank_account,
            amount,
            client,
            order,
            comment: new.comment,
            created: Utc::now(),
            completed_date: None,
            created_by: actor,
            transfer: None,
        };
        state.transactions.insert(id, row.clone());
        tracing::debug!(transaction = %id, kind = ?row.kind, amount = %row.amount, "transaction created");
        Ok(row)
    }

    pub fn transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.state
            .read()
            .transactions
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TransactionNotFound)
    }

    /// Edits a pending transaction. Completed rows are immutable and transfer
    /// legs can only be edited through
    /// [`update_transfer`](Self::update_transfer).
    pub fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        if patch.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write();
        let (kind, client, current_account) = {
            let row = state
                .transactions
                .get(&id)
                .ok_or(LedgerError::TransactionNotFound)?;
            if !row.is_pending() {
                return Err(LedgerError::CompletedTransaction);
            }
            if row.kind == TransactionKind::Transfer {
                return Err(LedgerError::TransferPairRequired);
            }
            (row.kind, row.client, row.bank_account)
        };

        let bank_account = match kind {
            TransactionKind::ClientAccountPayment => {
                let client_id = client.ok_or(LedgerError::MissingClient)?;
                state
                    .deposit_account_for(client_id)
                    .ok_or(LedgerError::NoDepositAccount)?
            }
            _ => match patch.bank_account {
                Some(account) => {
                    if !state.accounts.contains_key(&account) {
                        return Err(LedgerError::AccountNotFound);
                    }
                    account
                }
                None => current_account,
            },
        };

        let amount = if kind.is_debit() {
            -patch.amount
        } else {
            patch.amount
        };
        let row = state
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound)?;
        row.bank_account = bank_account;
        row.amount = amount;
        row.comment = patch.comment;
        Ok(row.clone())
    }

    /// Deletes a pending transaction. Deleting either leg of a transfer
    /// removes the whole pair.
    pub fn delete_transaction(&self, id: TransactionId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let row = state
            .transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound)?;
        if !row.is_pending() {
            return Err(LedgerError::CompletedTransaction);
        }
        match row.transfer {
            Some(transfer_id) => state.remove_transfer(transfer_id)?,
            None => {
                state.transactions.remove(&id);
            }
        }
        Ok(())
    }

    /// Completed transactions created within the date range (inclusive).
    pub fn completed_transactions(&self, start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
        self.state
            .read()
            .transactions
            .values()
            .filter(|t| !t.is_pending())
            .filter(|t| {
                let day = t.created.date_naive();
                day >= start && day <= end
            })
            .cloned()
            .collect()
    }

    /// Completed order payments visible to the actor.
    ///
    /// Without [`Capability::ViewAllPayments`] the listing is restricted to
    /// payments on orders the actor manages.
    pub fn payments(&self, actor: ActorId) -> Vec<Transaction> {
        let view_all = self
            .auth
            .capabilities(actor)
            .allows(Capability::ViewAllPayments);
        let state = self.state.read();
        state
            .transactions
            .values()
            .filter(|t| t.kind == TransactionKind::OrderPayment && !t.is_pending())
            .filter(|t| {
                view_all
                    || t.order
                        .and_then(|id| state.orders.get(&id))
                        .is_some_and(|order| order.manager == Some(actor))
            })
            .cloned()
            .collect()
    }

    // === Transfers ===

    /// Moves money between two accounts by creating the linked pair of rows
    /// in one step: the outgoing row on `source` with `-amount`, the incoming
    /// row on `dest` with `+amount`.
    pub fn create_transfer(
        &self,
        actor: ActorId,
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        comment: Option<String>,
    ) -> Result<Transfer, LedgerError> {
        if source == dest {
            return Err(LedgerError::SameAccountTransfer);
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write();
        for account in [source, dest] {
            if !state.accounts.contains_key(&account) {
                return Err(LedgerError::AccountNotFound);
            }
        }

        let transfer_id = TransferId(bump(&mut state.ids.transfer));
        let outgoing_id = TransactionId(bump(&mut state.ids.transaction));
        let incoming_id = TransactionId(bump(&mut state.ids.transaction));
        let now = Utc::now();

        let leg = |id: TransactionId, account: AccountId, amount: Decimal| Transaction {
            id,
            kind: TransactionKind::Transfer,
            category: None,
            bank_account: account,
            amount,
            client: None,
            order: None,
            comment: comment.clone(),
            created: now,
            completed_date: None,
            created_by: actor,
            transfer: Some(transfer_id),
        };
        let outgoing_row = leg(outgoing_id, source, -amount);
        let incoming_row = leg(incoming_id, dest, amount);
        state.transactions.insert(outgoing_id, outgoing_row);
        state.transactions.insert(incoming_id, incoming_row);

        let transfer = Transfer {
            id: transfer_id,
            outgoing: TransferLeg {
                account: source,
                transaction: outgoing_id,
            },
            incoming: TransferLeg {
                account: dest,
                transaction: incoming_id,
            },
            amount,
        };
        state.transfers.insert(transfer_id, transfer.clone());
        tracing::debug!(transfer = %transfer_id, %source, %dest, %amount, "transfer created");
        Ok(transfer)
    }

    pub fn transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.state
            .read()
            .transfers
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TransferNotFound)
    }

    /// Re-points both legs of a pending transfer at the (possibly changed)
    /// source and destination accounts and replaces the amount.
    pub fn update_transfer(
        &self,
        id: TransferId,
        source: AccountId,
        dest: AccountId,
        amount: Decimal,
        comment: Option<String>,
    ) -> Result<Transfer, LedgerError> {
        if source == dest {
            return Err(LedgerError::SameAccountTransfer);
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut state = self.state.write();
        for account in [source, dest] {
            if !state.accounts.contains_key(&account) {
                return Err(LedgerError::AccountNotFound);
            }
        }

        let (outgoing_id, incoming_id) = {
            let transfer = state
                .transfers
                .get(&id)
                .ok_or(LedgerError::TransferNotFound)?;
            (transfer.outgoing.transaction, transfer.incoming.transaction)
        };
        for leg in [outgoing_id, incoming_id] {
            let row = state
                .transactions
                .get(&leg)
                .ok_or(LedgerError::TransactionNotFound)?;
            if !row.is_pending() {
                return Err(LedgerError::CompletedTransaction);
            }
        }

        let mut repoint = |leg: TransactionId,
                           account: AccountId,
                           signed: Decimal|
         -> Result<(), LedgerError> {
            let row = state
                .transactions
                .get_mut(&leg)
                .ok_or(LedgerError::TransactionNotFound)?;
            row.bank_account = account;
            row.amount = signed;
            row.comment = comment.clone();
            Ok(())
        };
        repoint(outgoing_id, source, -amount)?;
        repoint(incoming_id, dest, amount)?;

        let transfer = state
            .transfers
            .get_mut(&id)
            .ok_or(LedgerError::TransferNotFound)?;
        transfer.outgoing = TransferLeg {
            account: source,
            transaction: outgoing_id,
        };
        transfer.incoming = TransferLeg {
            account: dest,
            transaction: incoming_id,
        };
        transfer.amount = amount;
        Ok(transfer.clone())
    }

    /// Removes both rows of a pending transfer together.
    pub fn delete_transfer(&self, id: TransferId) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.remove_transfer(id)
    }
}

impl LedgerState {
    fn remove_transfer(&mut self, id: TransferId) -> Result<(), LedgerError> {
        let (outgoing_id, incoming_id) = {
            let transfer = self.transfers.get(&id).ok_or(LedgerError::TransferNotFound)?;
            (transfer.outgoing.transaction, transfer.incoming.transaction)
        };
        for leg in [outgoing_id, incoming_id] {
            if let Some(row) = self.transactions.get(&leg) {
                if !row.is_pending() {
                    return Err(LedgerError::CompletedTransaction);
                }
            }
        }
        self.transactions.remove(&outgoing_id);
        self.transactions.remove(&incoming_id);
        self.transfers.remove(&id);
        Ok(())
    }
}
