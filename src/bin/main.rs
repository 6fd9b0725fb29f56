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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use shift_ledger_rs::{
    AccountId, AccountTypeId, ActorId, Authorizer, CategoryId, CategoryKind, ClientId,
    CurrencyFormat, Ledger, LedgerError, NewClient, NewOrder, NewTransaction, OrderId,
    TransactionKind,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The actor the CLI replays as; it is granted every capability.
const OPERATOR: ActorId = ActorId(1);

/// Shift Ledger - Replay ledger operation CSV files
///
/// Reads operations from a CSV file, replays them into a fresh ledger and
/// writes the shift account summary to stdout.
#[derive(Parser, Debug)]
#[command(name = "shift-ledger-rs")]
#[command(about = "Replays ledger operation CSVs and prints the account summary", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,name,kind,amount,account,client,order,source,dest
    /// Example: cargo run -- operations.csv > summary.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Close the shift after replaying all operations
    #[arg(long)]
    close: bool,

    /// Print plain decimals instead of the ruble presentation format
    #[arg(long)]
    plain: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let replay = match replay_operations(BufReader::new(file)) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Error replaying operations: {}", e);
            process::exit(1);
        }
    };

    if args.close {
        if let Err(e) = replay.ledger.close_shift(OPERATOR) {
            eprintln!("Error closing shift: {}", e);
            process::exit(1);
        }
    }

    let format = if args.plain {
        CurrencyFormat::plain()
    } else {
        CurrencyFormat::default()
    };
    if let Err(e) = write_summary(&replay.ledger, &format, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, name, kind, amount, account, client, order, source, dest`.
/// Entities reference each other by allocation order: the first `account`
/// row is account 1, the first `order` row is order 1, and so on.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    name: Option<String>,
    kind: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    account: Option<u32>,
    client: Option<u32>,
    order: Option<u32>,
    source: Option<u32>,
    dest: Option<u32>,
}

/// One replayable ledger operation.
#[derive(Debug)]
enum Operation {
    Account { name: String, type_name: Option<String> },
    Category { name: String, kind: CategoryKind },
    Client { name: String },
    Order { product: String, client: ClientId, amount: Decimal },
    Income { amount: Decimal, account: AccountId, category: String },
    Expense { amount: Decimal, account: AccountId, category: String },
    OrderPayment { amount: Decimal, account: AccountId, order: OrderId },
    ClientDeposit { amount: Decimal, account: AccountId, client: ClientId },
    ClientPayment { amount: Decimal, client: ClientId, order: OrderId },
    Transfer { amount: Decimal, source: AccountId, dest: AccountId },
    CloseShift,
}

impl CsvRecord {
    /// Converts the record into an operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "account" => Some(Operation::Account {
                name: self.name?,
                type_name: self.kind,
            }),
            "category" => {
                let kind = match self.kind?.as_str() {
                    "income" => CategoryKind::Income,
                    "expense" => CategoryKind::Expense,
                    _ => return None,
                };
                Some(Operation::Category {
                    name: self.name?,
                    kind,
                })
            }
            "client" => Some(Operation::Client { name: self.name? }),
            "order" => Some(Operation::Order {
                product: self.name?,
                client: ClientId(self.client?),
                amount: self.amount?,
            }),
            "income" => Some(Operation::Income {
                amount: self.amount?,
                account: AccountId(self.account?),
                category: self.name?,
            }),
            "expense" => Some(Operation::Expense {
                amount: self.amount?,
                account: AccountId(self.account?),
                category: self.name?,
            }),
            "order_payment" => Some(Operation::OrderPayment {
                amount: self.amount?,
                account: AccountId(self.account?),
                order: OrderId(self.order?),
            }),
            "client_deposit" => Some(Operation::ClientDeposit {
                amount: self.amount?,
                account: AccountId(self.account?),
                client: ClientId(self.client?),
            }),
            "client_payment" => Some(Operation::ClientPayment {
                amount: self.amount?,
                client: ClientId(self.client?),
                order: OrderId(self.order?),
            }),
            "transfer" => Some(Operation::Transfer {
                amount: self.amount?,
                source: AccountId(self.source?),
                dest: AccountId(self.dest?),
            }),
            "close_shift" => Some(Operation::CloseShift),
            _ => None,
        }
    }
}

/// A ledger plus the name lookups the replay builds as it goes.
pub struct Replay {
    pub ledger: Ledger,
    account_types: HashMap<String, AccountTypeId>,
    categories: HashMap<String, CategoryId>,
}

impl Replay {
    fn new() -> Self {
        let auth = Arc::new(Authorizer::new());
        auth.grant_all(OPERATOR);
        Self {
            ledger: Ledger::new(auth),
            account_types: HashMap::new(),
            categories: HashMap::new(),
        }
    }

    fn account_type(&mut self, name: String) -> Result<AccountTypeId, LedgerError> {
        if let Some(id) = self.account_types.get(&name) {
            return Ok(*id);
        }
        let row = self.ledger.create_account_type(name.clone())?;
        self.account_types.insert(name, row.id);
        Ok(row.id)
    }

    fn category(&mut self, name: String, kind: CategoryKind) -> Result<CategoryId, LedgerError> {
        if let Some(id) = self.categories.get(&name) {
            return Ok(*id);
        }
        let row = self.ledger.create_category(name.clone(), kind)?;
        self.categories.insert(name, row.id);
        Ok(row.id)
    }

    fn apply(&mut self, operation: Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::Account { name, type_name } => {
                let account_type = match type_name {
                    Some(type_name) => Some(self.account_type(type_name)?),
                    None => None,
                };
                self.ledger.create_account(name, account_type)?;
            }
            Operation::Category { name, kind } => {
                self.category(name, kind)?;
            }
            Operation::Client { name } => {
                self.ledger.create_client(NewClient::named(name))?;
            }
            Operation::Order {
                product,
                client,
                amount,
            } => {
                self.ledger.create_order(NewOrder {
                    client,
                    product,
                    manager: None,
                    amount,
                    status: "new".into(),
                })?;
            }
            Operation::Income {
                amount,
                account,
                category,
            } => {
                let category = self.category(category, CategoryKind::Income)?;
                self.ledger.create_transaction(
                    OPERATOR,
                    NewTransaction::new(TransactionKind::Income, amount)
                        .on_account(account)
                        .in_category(category),
                )?;
            }
            Operation::Expense {
                amount,
                account,
                category,
            } => {
                let category = self.category(category, CategoryKind::Expense)?;
                self.ledger.create_transaction(
                    OPERATOR,
                    NewTransaction::new(TransactionKind::Expense, amount)
                        .on_account(account)
                        .in_category(category),
                )?;
            }
            Operation::OrderPayment {
                amount,
                account,
                order,
            } => {
                self.ledger.create_transaction(
                    OPERATOR,
                    NewTransaction::new(TransactionKind::OrderPayment, amount)
                        .on_account(account)
                        .for_order(order),
                )?;
            }
            Operation::ClientDeposit {
                amount,
                account,
                client,
            } => {
                self.ledger.create_transaction(
                    OPERATOR,
                    NewTransaction::new(TransactionKind::ClientAccountDeposit, amount)
                        .on_account(account)
                        .for_client(client),
                )?;
            }
            Operation::ClientPayment {
                amount,
                client,
                order,
            } => {
                self.ledger.create_transaction(
                    OPERATOR,
                    NewTransaction::new(TransactionKind::ClientAccountPayment, amount)
                        .for_client(client)
                        .for_order(order),
                )?;
            }
            Operation::Transfer {
                amount,
                source,
                dest,
            } => {
                self.ledger
                    .create_transfer(OPERATOR, source, dest, amount, None)?;
            }
            Operation::CloseShift => {
                self.ledger.close_shift(OPERATOR)?;
            }
        }
        Ok(())
    }
}

/// Replays operations from a CSV reader into a fresh ledger.
///
/// Streaming parse: malformed rows and rejected operations are logged and
/// skipped, they never abort the replay.
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn replay_operations<R: Read>(reader: R) -> Result<Replay, csv::Error> {
    let mut replay = Replay::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(operation) = record.into_operation() else {
                    tracing::warn!("skipping invalid operation record");
                    continue;
                };
                if let Err(e) = replay.apply(operation) {
                    tracing::warn!(error = %e, "skipping rejected operation");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(replay)
}

/// Writes the shift account summary as CSV.
///
/// Columns: `type, account, balance, shift_amount, total`, amounts rendered
/// through the given [`CurrencyFormat`].
pub fn write_summary<W: Write>(
    ledger: &Ledger,
    format: &CurrencyFormat,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["type", "account", "balance", "shift_amount", "total"])?;

    let view = ledger.current_shift(OPERATOR);
    for group in &view.accounts {
        for row in &group.accounts {
            wtr.write_record([
                group.type_name.as_str(),
                row.name.as_str(),
                &format.format(row.balance),
                &format.format(row.shift_amount),
                &format.format(row.total),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
