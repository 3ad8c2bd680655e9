use std::sync::Arc;

use tabledb::*;

fn main() -> Result<()> {
    println!("In-Memory Table Store Demo\n");

    // Create DB
    let db = Arc::new(Database::new());

    // Create table "users" through the typed API
    let schema = Schema::new(vec![
        ColumnDef::new("id", DataType::Int)?,
        ColumnDef::new("name", DataType::String)?,
        ColumnDef::new("age", DataType::Int)?,
    ])?;
    db.create_table("users", schema)?;
    println!("Created table 'users'");

    // Insert data
    println!("Inserting data...");
    db.insert("users", vec![Value::Int(1), Value::from("Alice"), Value::Int(30)])?;
    db.insert("users", vec![Value::Int(2), Value::from("Bob"), Value::Int(41)])?;
    // quoted integers are accepted by INT columns
    db.insert("users", vec![Value::Int(3), Value::from("Charlie"), Value::from("25")])?;
    println!("Inserted 3 rows\n");

    // Read and print data
    println!("Reading data:");
    println!("{:<5} {:<10} {:<5}", "ID", "NAME", "AGE");
    println!("{}", "-".repeat(25));
    for row in db.select("users", None)? {
        let field = |name: &str| row.get(name).map(Value::to_string).unwrap_or_default();
        println!("{:<5} {:<10} {:<5}", field("id"), field("name"), field("age"));
    }

    // The same catalog driven by command lines
    println!("\nRunning commands:");
    let mut processor = CommandProcessor::with_database(Arc::clone(&db));
    for line in [
        r#"UPDATE users SET age=31 WHERE name="Alice""#,
        "SELECT * FROM users WHERE id=1 OR id=3",
        "DELETE FROM users WHERE age=41",
        "SELECT * FROM ghosts",
        "SHOW TABLES",
        "EXIT",
    ] {
        println!("> {line}");
        println!("{}", processor.process(line));
    }

    Ok(())
}
