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

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! The engine takes its state lock and the authorizer map in a fixed order
//! (capabilities first, state second); these tests run a mixed concurrent
//! workload and assert the lock graph never forms a cycle.

use parking_lot::deadlock;
use rust_decimal_macros::dec;
use shift_ledger_rs::{
    ActorId, Authorizer, CategoryKind, Ledger, NewClient, NewOrder, NewTransaction,
    TransactionKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn concurrent_mixed_workload_has_no_deadlocks() {
    let auth = Arc::new(Authorizer::new());
    let ledger = Arc::new(Ledger::new(Arc::clone(&auth)));

    let supervisor = ActorId(1);
    auth.grant_all(supervisor);
    for cashier in 2..=4u32 {
        auth.grant(
            ActorId(cashier),
            shift_ledger_rs::Capability::CloseShift,
        );
    }

    let cash = ledger.create_account("Cash", None).unwrap();
    let bank = ledger.create_account("Bank", None).unwrap();
    let sales = ledger.create_category("Sales", CategoryKind::Income).unwrap();
    let client = ledger.create_client(NewClient::named("Acme")).unwrap();
    let order = ledger
        .create_order(NewOrder {
            client: client.id,
            product: "signage".into(),
            manager: Some(supervisor),
            amount: dec!(1000000.00),
            status: "new".into(),
        })
        .unwrap();

    // Watchdog polling the global deadlock detector while the workload runs.
    let stop = Arc::new(AtomicBool::new(false));
    let deadlocked = Arc::new(AtomicBool::new(false));
    let watchdog = {
        let stop = Arc::clone(&stop);
        let deadlocked = Arc::clone(&deadlocked);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                if !deadlock::check_deadlock().is_empty() {
                    deadlocked.store(true, Ordering::Relaxed);
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
        })
    };

    let mut handles = Vec::new();
    for worker in 0..4u32 {
        let ledger = Arc::clone(&ledger);
        let actor = ActorId(worker % 4 + 1);
        let account = if worker % 2 == 0 { cash.id } else { bank.id };
        let category = sales.id;
        let order_id = order.id;
        let client_id = client.id;
        handles.push(thread::spawn(move || {
            for round in 0..200u32 {
                match round % 5 {
                    0 => {
                        let _ = ledger.create_transaction(
                            actor,
                            NewTransaction::new(TransactionKind::Income, dec!(3.00))
                                .on_account(account)
                                .in_category(category),
                        );
                    }
                    1 => {
                        let _ = ledger.create_transaction(
                            actor,
                            NewTransaction::new(TransactionKind::OrderPayment, dec!(1.00))
                                .on_account(account)
                                .for_order(order_id),
                        );
                    }
                    2 => {
                        let _ = ledger.order_debt(order_id);
                        let _ = ledger.client_balance(client_id);
                    }
                    3 => {
                        let _ = ledger.current_shift(actor);
                    }
                    _ => {
                        let _ = ledger.close_shift(actor);
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    watchdog.join().unwrap();

    assert!(
        !deadlocked.load(Ordering::Relaxed),
        "deadlock detected in the concurrent workload"
    );

    // the workload must have left the ledger in a closeable state
    let final_close = ledger.close_shift(supervisor);
    assert!(
        final_close.is_ok()
            || final_close == Err(shift_ledger_rs::LedgerError::NoPendingTransactions)
    );
    assert!(ledger.current_shift(supervisor).transactions.is_empty());
}
