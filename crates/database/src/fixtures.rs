//! In-memory sales database for tests in this and dependent crates.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE "dbo_F_Sales_Transaction" (
        "Sales Txn Key" INTEGER,
        "Customer Key" TEXT,
        "Item Key" TEXT,
        "Txn Date" TEXT,
        "Net Sales Amount" REAL,
        "Net Sales Quantity" REAL,
        "Cost Amount" REAL,
        "Unit of Measure" TEXT,
        "Location Code" TEXT,
        "Deleted Flag" INTEGER DEFAULT 0,
        "Excluded Flag" INTEGER DEFAULT 0
    )"#,
    r#"CREATE TABLE "dbo_D_Item" (
        "Item Key" TEXT PRIMARY KEY,
        "Item Desc" TEXT,
        "Item Category Desc" TEXT,
        "Item Subcategory Desc" TEXT
    )"#,
    r#"CREATE TABLE "dbo_D_Customer" (
        "Customer Key" TEXT PRIMARY KEY,
        "Customer Type Desc" TEXT
    )"#,
];

/// One fact-table row. Unset optional columns are stored as NULL.
#[derive(Debug, Clone, Default)]
pub struct Sale {
    pub txn_key: i64,
    pub customer: &'static str,
    pub item: &'static str,
    pub date: &'static str,
    pub amount: f64,
    pub quantity: f64,
    pub cost: f64,
    pub payment_method: Option<&'static str>,
    pub location: Option<&'static str>,
    pub deleted: bool,
    pub excluded: bool,
}

/// A single-connection pool over a fresh in-memory database with the three
/// source tables created and empty.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(&pool).await?;
    }
    Ok(pool)
}

pub async fn insert_item(
    pool: &SqlitePool,
    key: &str,
    desc: &str,
    category: &str,
    subcategory: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "dbo_D_Item" ("Item Key", "Item Desc", "Item Category Desc", "Item Subcategory Desc")
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(key)
    .bind(desc)
    .bind(category)
    .bind(subcategory)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_customer(pool: &SqlitePool, key: &str, customer_type: &str) -> Result<(), sqlx::Error> {
    sqlx::query(r#"INSERT INTO "dbo_D_Customer" ("Customer Key", "Customer Type Desc") VALUES (?, ?)"#)
        .bind(key)
        .bind(customer_type)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_sale(pool: &SqlitePool, sale: &Sale) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO "dbo_F_Sales_Transaction" (
               "Sales Txn Key", "Customer Key", "Item Key", "Txn Date", "Net Sales Amount",
               "Net Sales Quantity", "Cost Amount", "Unit of Measure", "Location Code",
               "Deleted Flag", "Excluded Flag")
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(sale.txn_key)
    .bind(sale.customer)
    .bind(sale.item)
    .bind(sale.date)
    .bind(sale.amount)
    .bind(sale.quantity)
    .bind(sale.cost)
    .bind(sale.payment_method)
    .bind(sale.location)
    .bind(sale.deleted as i64)
    .bind(sale.excluded as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// A small store: two items in two categories, three customers of two
/// types, and seven sales across January and February 2024 (one deleted).
pub async fn seeded_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = memory_pool().await?;
    insert_item(&pool, "I1", "Espresso Beans", "Coffee", Some("Whole Bean")).await?;
    insert_item(&pool, "I2", "Ceramic Mug", "Homeware", None).await?;
    insert_customer(&pool, "C1", "Retail").await?;
    insert_customer(&pool, "C2", "Retail").await?;
    insert_customer(&pool, "C3", "Wholesale").await?;

    let sales = [
        Sale { txn_key: 1, customer: "C1", item: "I1", date: "2024-01-02 09:15:00", amount: 20.0, quantity: 2.0, cost: 12.0, payment_method: Some("Card"), ..Sale::default() },
        Sale { txn_key: 1, customer: "C1", item: "I2", date: "2024-01-02 09:15:00", amount: 15.0, quantity: 1.0, cost: 5.0, payment_method: Some("Card"), ..Sale::default() },
        Sale { txn_key: 2, customer: "C1", item: "I1", date: "2024-01-20 17:40:00", amount: 30.0, quantity: 3.0, cost: 18.0, payment_method: Some("Cash"), ..Sale::default() },
        Sale { txn_key: 3, customer: "C2", item: "I2", date: "2024-01-31T23:30:00", amount: 45.0, quantity: 3.0, cost: 15.0, ..Sale::default() },
        Sale { txn_key: 4, customer: "C3", item: "I1", date: "2024-01-15", amount: 400.0, quantity: 40.0, cost: 240.0, payment_method: Some("Invoice"), ..Sale::default() },
        Sale { txn_key: 5, customer: "C3", item: "I1", date: "2024-01-16", amount: 999.0, quantity: 1.0, cost: 0.0, deleted: true, ..Sale::default() },
        Sale { txn_key: 6, customer: "C2", item: "I1", date: "2024-02-10 12:00:00", amount: 50.0, quantity: 5.0, cost: 30.0, payment_method: Some("Card"), ..Sale::default() },
    ];
    for sale in &sales {
        insert_sale(&pool, sale).await?;
    }
    Ok(pool)
}
