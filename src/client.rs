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

//! Clients and their personal accounts.

use crate::base::ClientId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A client with a prepaid personal account.
///
/// `balance` is the settled personal-account balance; deposits and payments
/// still in the current shift are added on top by
/// [`client_balance`](crate::Ledger::client_balance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub legal_name: Option<String>,
    pub inn: Option<String>,
    pub comment: Option<String>,
    pub balance: Decimal,
}

/// Input for registering a client.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub legal_name: Option<String>,
    pub inn: Option<String>,
    pub comment: Option<String>,
}

impl NewClient {
    /// A client with just a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
