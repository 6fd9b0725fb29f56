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

//! Error types for ledger operations.

use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is zero or negative where a positive magnitude is required
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Income/expense transaction submitted without a category
    #[error("a category is required for income and expense transactions")]
    MissingCategory,

    /// Category sign does not match the transaction kind
    #[error("category kind does not match the transaction kind")]
    CategoryKindMismatch,

    /// Transaction kind requires an order reference
    #[error("an order is required for this transaction kind")]
    MissingOrder,

    /// Transaction kind requires a client reference
    #[error("a client is required for this transaction kind")]
    MissingClient,

    /// Transaction kind requires a bank account reference
    #[error("a bank account is required for this transaction kind")]
    MissingAccount,

    /// Name field is empty
    #[error("name must not be empty")]
    EmptyName,

    /// Payment would exceed the outstanding order debt
    #[error("amount exceeds the outstanding order debt")]
    AmountExceedsDebt,

    /// Client personal account cannot cover the payment
    #[error("insufficient client account balance")]
    InsufficientClientBalance,

    /// Transfer source and destination are the same account
    #[error("source and destination accounts must differ")]
    SameAccountTransfer,

    /// No bank account could be derived for a client account payment
    #[error("no bank account available for the client payment")]
    NoDepositAccount,

    /// Transfer rows cannot be managed as single transactions
    #[error("transfer rows are managed as a pair")]
    TransferPairRequired,

    /// Referenced bank account does not exist
    #[error("bank account not found")]
    AccountNotFound,

    /// Referenced bank account type does not exist
    #[error("bank account type not found")]
    AccountTypeNotFound,

    /// Referenced category does not exist
    #[error("category not found")]
    CategoryNotFound,

    /// Referenced client does not exist
    #[error("client not found")]
    ClientNotFound,

    /// Referenced order does not exist
    #[error("order not found")]
    OrderNotFound,

    /// Referenced transaction does not exist
    #[error("transaction not found")]
    TransactionNotFound,

    /// Referenced transfer does not exist
    #[error("transfer not found")]
    TransferNotFound,

    /// Actor lacks the capability required for the operation
    #[error("missing the capability required for this operation")]
    Forbidden,

    /// Shift close requested with nothing to close
    #[error("no pending transactions to close")]
    NoPendingTransactions,

    /// Completed transactions cannot be edited or deleted
    #[error("completed transactions are immutable")]
    CompletedTransaction,

    /// Bank account still referenced by transactions
    #[error("cannot delete a bank account with transactions")]
    AccountInUse,

    /// Category still referenced by transactions
    #[error("cannot delete a category with transactions")]
    CategoryInUse,
}

/// Coarse classification used by callers that map errors onto a transport
/// (HTTP status codes in the demo server).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing input; no retry will help without a changed request
    Validation,
    /// A referenced entity does not exist
    NotFound,
    /// The actor is not allowed to perform the operation
    Forbidden,
    /// The operation would corrupt referential integrity
    Integrity,
}

impl LedgerError {
    /// Classifies the error into the four caller-facing kinds.
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            InvalidAmount | MissingCategory | CategoryKindMismatch | MissingOrder
            | MissingClient | MissingAccount | EmptyName | AmountExceedsDebt
            | InsufficientClientBalance | SameAccountTransfer | NoDepositAccount
            | TransferPairRequired | NoPendingTransactions => ErrorKind::Validation,
            AccountNotFound | AccountTypeNotFound | CategoryNotFound | ClientNotFound
            | OrderNotFound | TransactionNotFound | TransferNotFound => ErrorKind::NotFound,
            Forbidden => ErrorKind::Forbidden,
            CompletedTransaction | AccountInUse | CategoryInUse => ErrorKind::Integrity,
        }
    }
}
