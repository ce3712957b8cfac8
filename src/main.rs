use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use txn_import::{
    get_balance, list_categories, list_transactions, logging, setup_database, Importer, Transaction,
    VERSION,
};

/// Import CSV transaction files into SQLite
#[derive(Parser, Debug)]
#[command(name = "txn-import", version, about)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "TXN_IMPORT_DATABASE", default_value = "transactions.db")]
    database: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, global = true, env = "TXN_IMPORT_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV file (title,type,value,category); the file is deleted afterwards
    Import {
        file: PathBuf,

        /// Print the created transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored transactions and the balance
    List {
        #[arg(long)]
        json: bool,
    },

    /// List stored categories
    Categories,

    /// Show income, outcome and total
    Balance,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    tracing::debug!("txn-import v{} starting", VERSION);

    let mut conn = open_database(&cli.database)?;

    match cli.command {
        Command::Import { file, json } => run_import(&mut conn, &file, json),
        Command::List { json } => run_list(&conn, json),
        Command::Categories => run_categories(&conn),
        Command::Balance => run_balance(&conn),
    }
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn).context("Failed to initialize database schema")?;

    tracing::debug!(database = %path.display(), "database ready");
    Ok(conn)
}

fn run_import(conn: &mut Connection, file: &Path, json: bool) -> Result<()> {
    let outcome = Importer::new(conn)
        .execute(file)
        .with_context(|| format!("Import of {} failed", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.transactions)?);
    } else {
        println!("✓ Imported {} transactions", outcome.transactions.len());
        println!("✓ New categories: {}", outcome.categories_created.len());
        if outcome.skipped_rows > 0 {
            println!("✓ Skipped incomplete rows: {}", outcome.skipped_rows);
        }
        for tx in &outcome.transactions {
            print_transaction(tx, None);
        }
    }

    if let Some(err) = &outcome.cleanup_error {
        eprintln!("⚠️  {}", err);
    }

    Ok(())
}

fn run_list(conn: &Connection, json: bool) -> Result<()> {
    let records = list_transactions(conn)?;
    let balance = get_balance(conn)?;

    if json {
        let body = serde_json::json!({
            "transactions": records,
            "balance": balance,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for record in &records {
        let category = record.category.as_ref().map(|c| c.title.as_str());
        print_transaction(&record.transaction, category);
    }
    println!();
    print_balance(balance.income, balance.outcome, balance.total);

    Ok(())
}

fn run_categories(conn: &Connection) -> Result<()> {
    for category in list_categories(conn)? {
        println!("{}  {}", category.id, category.title);
    }

    Ok(())
}

fn run_balance(conn: &Connection) -> Result<()> {
    let balance = get_balance(conn)?;
    print_balance(balance.income, balance.outcome, balance.total);

    Ok(())
}

fn print_transaction(tx: &Transaction, category: Option<&str>) {
    let category = category.map(str::to_string).unwrap_or_else(|| match &tx.category_id {
        Some(id) => id.clone(),
        None => "-".to_string(),
    });

    println!(
        "  {:<36}  {:<24}  {:<8}  {:>12.2}  {}",
        tx.id, tx.title, tx.transaction_type, tx.value, category
    );
}

fn print_balance(income: f64, outcome: f64, total: f64) {
    println!("Income:  {:>12.2}", income);
    println!("Outcome: {:>12.2}", outcome);
    println!("Total:   {:>12.2}", total);
}
