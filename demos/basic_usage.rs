//! Basic table store usage example
//!
//! This example demonstrates:
//! - Creating a table with a typed schema
//! - Inserting rows
//! - Selecting with conditions
//! - Updating and removing rows
//! - Indices and uniqueness checks
//! - The statement front end
//!
//! Run with: cargo run --example basic_usage

use rust_table_store::prelude::*;

fn print_users(db: &Database, condition: &str) -> Result<()> {
    let mut rows = db.select("users", condition)?;
    rows.sort_by_key(|r| r["id"].as_int());
    for r in &rows {
        println!("   id={} name={} is_admin={}", r["id"], r["name"], r["is_admin"]);
    }
    println!("   ({} rows)", rows.len());
    Ok(())
}

fn main() -> Result<()> {
    println!("=== rust_table_store - Basic Usage Example ===\n");

    let mut db = Database::new();

    println!("1. Creating table...");
    let schema = Schema::new(vec![
        ColumnDef::new("id", ColumnType::Int32).not_null(),
        ColumnDef::new("name", ColumnType::String),
        ColumnDef::new("is_admin", ColumnType::Bool),
    ])?;
    db.create_table("users", schema)?;
    println!("   ✓ Table created\n");

    println!("2. Inserting data...");
    for (id, name, admin) in [(1, "Alice", false), (2, "Bob", true), (3, "Charlie", false)] {
        db.insert(
            "users",
            row([
                ("id", Value::Int(id)),
                ("name", Value::from(name)),
                ("is_admin", Value::Bool(admin)),
            ]),
        )?;
    }
    println!("   ✓ Inserted {} rows\n", db.table("users")?.len());

    println!("3. Querying data...");
    println!("   All users:");
    print_users(&db, "true")?;
    println!("   Admins or Charlie:");
    print_users(&db, "is_admin=true OR name='Charlie'")?;
    println!();

    println!("4. Rejected inserts leave the table untouched...");
    if let Err(e) = db.insert("users", row([("id", Value::from("four"))])) {
        println!("   ✗ {e}");
    }
    if let Err(e) = db.insert("users", row([("name", "Nobody")])) {
        println!("   ✗ {e}");
    }
    println!("   rows: {}\n", db.table("users")?.len());

    println!("5. Updating and removing...");
    let updated = db.update("users", "id=1", &row([("is_admin", true)]))?;
    println!("   ✓ Updated {updated} row(s)");
    let removed = db.remove("users", "id=3")?;
    println!("   ✓ Removed {removed} row(s)");
    print_users(&db, "true")?;
    println!();

    println!("6. Indices...");
    db.create_index("users", "name")?;
    println!(
        "   'Bob' unique: {}, 'Dave' unique: {}\n",
        db.is_unique("users", "name", &Value::from("Bob"))?,
        db.is_unique("users", "name", &Value::from("Dave"))?
    );

    println!("7. Statements...");
    db.execute("CREATE TABLE tags (tag:string,weight:int32)")?;
    db.execute("INSERT TO tags (tag='rust',weight=3)")?;
    db.execute("INSERT TO tags (tag='db',weight=1)")?;
    println!("{}", db.execute("SELECT * FROM tags WHERE weight=3")?);

    println!("\n=== Example completed successfully ===");
    Ok(())
}
