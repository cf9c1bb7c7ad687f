//! # Seed Data Generator
//!
//! Populates a development database with accounts, products and expense
//! categories.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p billdesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p billdesk-db --bin seed -- --db ./data/billdesk.db
//! ```
//!
//! ## Accounts
//! - `admin@billdesk.local` / `admin123` (admin)
//! - `cashier@billdesk.local` / `cashier123` (cashier)
//!
//! Running it twice is safe: existing accounts, products and categories are
//! left alone.

use anyhow::{anyhow, Context};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use billdesk_core::{Money, NewExpenseCategory, NewProduct, NewUser, Role};
use billdesk_db::{Database, DbConfig, DbError};
use std::env;
use tracing_subscriber::EnvFilter;

/// (name, email, password, role)
const ACCOUNTS: &[(&str, &str, &str, Role)] = &[
    ("Store Admin", "admin@billdesk.local", "admin123", Role::Admin),
    ("Front Cashier", "cashier@billdesk.local", "cashier123", Role::Cashier),
];

/// (category, unit, [(name, selling price in paisa)])
const PRODUCTS: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Grocery",
        "kg",
        &[
            ("Basmati Rice", 18_000),
            ("Masoor Dal", 16_000),
            ("Sugar", 11_000),
            ("Wheat Flour", 9_000),
        ],
    ),
    (
        "Beverages",
        "pcs",
        &[
            ("Ilam Tea 500g", 45_000),
            ("Coca-Cola 1.5L", 22_000),
            ("Mineral Water 1L", 3_000),
        ],
    ),
    (
        "Dairy",
        "pcs",
        &[("Milk 1L", 11_000), ("Paneer 200g", 20_000), ("Butter 100g", 16_500)],
    ),
    (
        "Household",
        "pcs",
        &[("Dish Soap", 8_500), ("Detergent 1kg", 28_000)],
    ),
];

/// (name, colour)
const EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Rent", "#EF4444"),
    ("Utilities", "#3B82F6"),
    ("Salaries", "#10B981"),
    ("Supplies", "#F59E0B"),
    ("Miscellaneous", "#6B7280"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./data/billdesk.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/billdesk.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Billdesk Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;
    println!("✓ Connected to database, migrations applied");

    // Accounts
    let mut accounts = 0;
    for (name, email, password, role) in ACCOUNTS {
        if db.users().find_by_email(email).await?.is_some() {
            println!("  {} exists, skipping", email);
            continue;
        }

        let user = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: *role,
            phone: None,
            address: None,
        };
        let (_, employee_id) = db.users().insert(&user).await?;
        println!("  + {} ({}, employee {})", email, role, employee_id);
        accounts += 1;
    }
    println!("✓ {} accounts created", accounts);

    // Products
    let existing: Vec<String> = db
        .products()
        .list()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut products = 0;
    for (category, unit, items) in PRODUCTS {
        for (index, (name, price)) in items.iter().enumerate() {
            if existing.iter().any(|n| n.as_str() == *name) {
                continue;
            }

            let product = NewProduct {
                name: name.to_string(),
                category: category.to_string(),
                unit: unit.to_string(),
                selling_price: Money::from_cents(*price),
                // cost at 80% of price
                cost_price: Money::from_cents(price * 80 / 100),
                stock: 20 + (index as i64 * 15),
                min_stock: 10,
                barcode: None,
                description: None,
            };
            db.products().insert(&product, Some("seed")).await?;
            products += 1;
        }
    }
    println!("✓ {} products created", products);

    // Expense categories
    let mut categories = 0;
    for (name, color) in EXPENSE_CATEGORIES {
        let category = NewExpenseCategory {
            name: name.to_string(),
            description: String::new(),
            color: color.to_string(),
            is_active: true,
        };
        match db.expenses().add_category(&category).await {
            Ok(_) => categories += 1,
            Err(DbError::UniqueViolation { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    println!("✓ {} expense categories created", categories);

    println!();
    println!("✓ Seed complete!");
    println!("  Next bill number: {}", db.bills().next_bill_number().await?);

    db.close().await;
    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("hashing password: {e}"))
}
