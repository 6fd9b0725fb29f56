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

//! Benchmarks for the ledger engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Transaction creation throughput
//! - Debt queries over a growing pending log, including parallel readers
//! - Shift close over batches of pending transactions

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use shift_ledger_rs::{
    AccountId, ActorId, Authorizer, CategoryId, CategoryKind, Ledger, NewClient, NewOrder,
    NewTransaction, OrderId, TransactionKind,
};
use std::sync::Arc;

const ACTOR: ActorId = ActorId(1);

struct Fixture {
    ledger: Ledger,
    account: AccountId,
    category: CategoryId,
    order: OrderId,
}

fn fixture() -> Fixture {
    let auth = Arc::new(Authorizer::new());
    auth.grant_all(ACTOR);
    let ledger = Ledger::new(auth);

    let account = ledger.create_account("Cash", None).unwrap().id;
    let category = ledger.create_category("Sales", CategoryKind::Income).unwrap().id;
    let client = ledger.create_client(NewClient::named("Acme")).unwrap().id;
    let order = ledger
        .create_order(NewOrder {
            client,
            product: "signage".into(),
            manager: None,
            amount: Decimal::new(1_000_000_00, 2),
            status: "new".into(),
        })
        .unwrap()
        .id;
    Fixture {
        ledger,
        account,
        category,
        order,
    }
}

fn income(fixture: &Fixture) {
    fixture
        .ledger
        .create_transaction(
            ACTOR,
            NewTransaction::new(TransactionKind::Income, Decimal::new(500, 2))
                .on_account(fixture.account)
                .in_category(fixture.category),
        )
        .unwrap();
}

fn bench_create_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_transaction");
    group.throughput(Throughput::Elements(1));
    group.bench_function("income", |b| {
        let fixture = fixture();
        b.iter(|| income(black_box(&fixture)));
    });
    group.finish();
}

fn bench_order_debt(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_debt");
    for pending in [100usize, 1_000, 10_000] {
        let fixture = fixture();
        for _ in 0..pending {
            fixture
                .ledger
                .create_transaction(
                    ACTOR,
                    NewTransaction::new(TransactionKind::OrderPayment, Decimal::new(1, 2))
                        .on_account(fixture.account)
                        .for_order(fixture.order),
                )
                .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("sequential", pending),
            &fixture,
            |b, fixture| b.iter(|| fixture.ledger.order_debt(black_box(fixture.order)).unwrap()),
        );
        group.bench_with_input(
            BenchmarkId::new("parallel_readers", pending),
            &fixture,
            |b, fixture| {
                b.iter(|| {
                    (0..16)
                        .into_par_iter()
                        .map(|_| fixture.ledger.order_debt(fixture.order).unwrap())
                        .reduce(|| Decimal::ZERO, |a, _| a)
                })
            },
        );
    }
    group.finish();
}

fn bench_close_shift(c: &mut Criterion) {
    let mut group = c.benchmark_group("close_shift");
    group.sample_size(20);
    for pending in [100usize, 1_000] {
        group.throughput(Throughput::Elements(pending as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(pending),
            &pending,
            |b, &pending| {
                b.iter_with_setup(
                    || {
                        let fixture = fixture();
                        for _ in 0..pending {
                            income(&fixture);
                        }
                        fixture
                    },
                    |fixture| fixture.ledger.close_shift(black_box(ACTOR)).unwrap(),
                )
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create_transaction,
    bench_order_debt,
    bench_close_shift
);
criterion_main!(benches);
