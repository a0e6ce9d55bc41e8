use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month};

use wally::{
    Frequency, NewRecurringTransaction, TransactionType, get_local_today, initialize_db,
    on_template_created,
};

const DEMO_TAGS: [&str; 7] = [
    "urgent",
    "monthly",
    "recurring",
    "gift",
    "bonus",
    "vacation",
    "subscription",
];

/// A utility for creating a demo database for the Wally API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The canonical name of the timezone used to decide today's date.
    #[arg(long, env = "WALLY_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,
}

/// Create a database filled with recurring transactions for trying out the API.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'wally.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut connection = Connection::open(output_path)?;
    initialize_db(&connection)?;

    println!("Creating tags...");
    for tag in DEMO_TAGS {
        connection.execute("INSERT INTO tag (name) VALUES (?1)", (tag,))?;
    }

    let today = get_local_today(&args.timezone)?;
    let start_date = Date::from_calendar_date(today.year() - 2, Month::January, 1)?;
    let end_date = Date::from_calendar_date(today.year() + 1, Month::December, 31)?;

    println!("Creating recurring transactions from {start_date} to {end_date}...");
    for new in demo_recurring_transactions(start_date, end_date) {
        let (recurring_transaction, summary) = on_template_created(&new, &mut connection)?;
        println!(
            "  {} ({}): {} transactions",
            recurring_transaction.name, recurring_transaction.frequency, summary.created
        );
    }

    println!("Success!");

    Ok(())
}

fn demo_recurring_transactions(start_date: Date, end_date: Date) -> Vec<NewRecurringTransaction> {
    let recurring = |name: &str,
                     category: &str,
                     tags: &[&str],
                     amount: f64,
                     transaction_type: TransactionType,
                     frequency: Frequency| NewRecurringTransaction {
        name: name.to_owned(),
        category: category.to_owned(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        amount,
        transaction_type,
        start_date,
        end_date,
        frequency,
    };

    vec![
        recurring(
            "Salary",
            "Income",
            &["monthly"],
            3200.0,
            TransactionType::Income,
            Frequency::Monthly,
        ),
        recurring(
            "Rent",
            "Rent",
            &["monthly", "recurring"],
            1150.0,
            TransactionType::Expense,
            Frequency::Monthly,
        ),
        recurring(
            "Groceries",
            "Groceries",
            &["recurring"],
            85.5,
            TransactionType::Expense,
            Frequency::Weekly,
        ),
        recurring(
            "Streaming service",
            "Entertainment",
            &["subscription"],
            12.99,
            TransactionType::Expense,
            Frequency::Monthly,
        ),
        recurring(
            "Coffee",
            "Food",
            &[],
            3.2,
            TransactionType::Expense,
            Frequency::Daily,
        ),
        recurring(
            "Travel insurance",
            "Travel",
            &["vacation"],
            240.0,
            TransactionType::Expense,
            Frequency::Yearly,
        ),
    ]
}
