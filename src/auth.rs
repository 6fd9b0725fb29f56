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

//! Actor authorization.
//!
//! The ledger queries the [`Authorizer`] once per request for the acting
//! user's [`CapabilitySet`] and makes every permission decision from that
//! snapshot.

use crate::base::ActorId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Things an actor may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Close the current shift, folding pending transactions into balances.
    CloseShift,
    /// See and close every actor's pending transactions, not only one's own.
    ViewAllShiftTransactions,
    /// See completed order payments for every order, not only managed ones.
    ViewAllPayments,
}

/// The capabilities granted to one actor, snapshotted per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(HashSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn revoke(&mut self, capability: Capability) {
        self.0.remove(&capability);
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Capability registry keyed by actor.
///
/// Concurrent reads are the common case (one lookup per ledger request);
/// grants and revocations are rare administrative writes.
#[derive(Debug, Default)]
pub struct Authorizer {
    grants: DashMap<ActorId, CapabilitySet>,
}

impl Authorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a single capability to an actor.
    pub fn grant(&self, actor: ActorId, capability: Capability) {
        self.grants.entry(actor).or_default().grant(capability);
    }

    /// Grants every capability to an actor.
    pub fn grant_all(&self, actor: ActorId) {
        for capability in [
            Capability::CloseShift,
            Capability::ViewAllShiftTransactions,
            Capability::ViewAllPayments,
        ] {
            self.grant(actor, capability);
        }
    }

    pub fn revoke(&self, actor: ActorId, capability: Capability) {
        if let Some(mut set) = self.grants.get_mut(&actor) {
            set.revoke(capability);
        }
    }

    /// Returns the actor's capability snapshot.
    ///
    /// Unknown actors get an empty set rather than an error; permission
    /// checks downstream decide what that means.
    pub fn capabilities(&self, actor: ActorId) -> CapabilitySet {
        self.grants
            .get(&actor)
            .map(|set| set.clone())
            .unwrap_or_default()
    }
}
