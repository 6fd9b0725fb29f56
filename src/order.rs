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

//! Orders.

use crate::base::{ActorId, ClientId, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A client order with a cached paid amount.
///
/// `paid_amount` only grows when a shift close folds order payments in; the
/// outstanding debt additionally nets payments still pending in the current
/// shift (see [`order_debt`](crate::Ledger::order_debt)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client: ClientId,
    pub product: String,
    pub manager: Option<ActorId>,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub created: DateTime<Utc>,
}

/// Input for registering an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client: ClientId,
    pub product: String,
    pub manager: Option<ActorId>,
    pub amount: Decimal,
    pub status: String,
}
