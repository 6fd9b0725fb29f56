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

//! Bank accounts and their types.

use crate::base::{AccountId, AccountTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Grouping label for bank accounts (cash desk, bank, card, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccountType {
    pub id: AccountTypeId,
    pub name: String,
}

/// A money account holding a cached balance.
///
/// `balance` only reflects transactions that have been folded in by a shift
/// close; the live position of an account is `balance` plus the sum of its
/// pending transactions (see the shift view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: AccountId,
    pub name: String,
    pub account_type: Option<AccountTypeId>,
    pub balance: Decimal,
}
