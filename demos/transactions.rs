//! Transaction example
//!
//! This example demonstrates:
//! - Beginning, committing and rolling back transactions
//! - Nested transactions
//! - `TransactionGuard` rolling back when a step fails
//! - Saving and loading a snapshot file
//!
//! Run with: cargo run --example transactions

use rust_table_store::prelude::*;

fn balance(db: &Database, id: i32) -> Result<Option<i32>> {
    let rows = db.select("accounts", &format!("id={id}"))?;
    Ok(rows.first().and_then(|r| r["balance"].as_int()))
}

fn print_balances(db: &Database) -> Result<()> {
    let mut rows = db.select("accounts", "true")?;
    rows.sort_by_key(|r| r["id"].as_int());
    for r in &rows {
        println!("   {:<8} {}", r["name"], r["balance"]);
    }
    Ok(())
}

/// Move `amount` between accounts; returns whether the transfer went through.
fn transfer(db: &mut Database, from: i32, to: i32, amount: i32) -> Result<bool> {
    let mut tx = TransactionGuard::begin(db)?;

    let from_balance = balance(&tx, from)?.unwrap_or(0) - amount;
    tx.update("accounts", &format!("id={from}"), &row([("balance", from_balance)]))?;
    if from_balance < 0 {
        // tx is dropped here and the debit is rolled back
        return Ok(false);
    }

    let Some(to_balance) = balance(&tx, to)? else {
        return Ok(false);
    };
    tx.update("accounts", &format!("id={to}"), &row([("balance", to_balance + amount)]))?;
    tx.commit()?;
    Ok(true)
}

fn main() -> Result<()> {
    println!("=== rust_table_store - Transaction Example ===\n");

    let mut db = Database::new();

    println!("1. Setting up accounts table...");
    db.create_table(
        "accounts",
        Schema::new(vec![
            ColumnDef::new("id", ColumnType::Int32).not_null(),
            ColumnDef::new("name", ColumnType::String),
            ColumnDef::new("balance", ColumnType::Int32).not_null(),
        ])?,
    )?;
    for (id, name, balance) in [(1, "Alice", 1000), (2, "Bob", 500), (3, "Charlie", 750)] {
        db.insert(
            "accounts",
            row([
                ("id", Value::Int(id)),
                ("name", Value::from(name)),
                ("balance", Value::Int(balance)),
            ]),
        )?;
    }
    print_balances(&db)?;

    println!("\n2. Successful transfer (Alice -> Bob: 100)");
    if transfer(&mut db, 1, 2, 100)? {
        println!("   ✓ Committed");
    }
    print_balances(&db)?;

    println!("\n3. Failed transfer (Bob -> Charlie: 10000)");
    if !transfer(&mut db, 2, 3, 10_000)? {
        println!("   ✓ Insufficient funds, rolled back");
    }
    print_balances(&db)?;

    println!("\n4. Nested transactions");
    db.begin_transaction();
    db.update("accounts", "id=3", &row([("balance", 0)]))?;
    db.begin_transaction();
    db.remove("accounts", "true")?;
    println!("   depth {}: {} accounts", db.transaction_depth(), db.table("accounts")?.len());
    db.rollback_transaction()?;
    println!("   depth {}: {} accounts", db.transaction_depth(), db.table("accounts")?.len());
    db.commit_transaction()?;
    println!("   depth {}: Charlie has {:?}", db.transaction_depth(), balance(&db, 3)?);

    println!("\n5. Snapshot to disk");
    let path = std::env::temp_dir().join("rust_table_store_transactions.db");
    db.save(&path)?;
    let mut restored = Database::new();
    let loaded = restored.load(&path)?;
    println!("   ✓ Loaded {loaded} table(s) from {}", path.display());
    print_balances(&restored)?;
    let _ = std::fs::remove_file(&path);

    println!("\n=== Example completed successfully ===");
    Ok(())
}
