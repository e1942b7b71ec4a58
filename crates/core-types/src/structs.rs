use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single row of the sales-transaction fact table, joined with the item
/// dimension for its category. Immutable and read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: NaiveDateTime,
    pub amount: f64,
    pub product_category: Option<String>,
    pub payment_method: Option<String>,
    pub location: Option<String>,
}

/// Sales figures for one product, category or subcategory group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesRow {
    pub product_id: Option<String>,
    pub product_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub sales_amount: f64,
    pub quantity: f64,
    pub cost: f64,
}

/// Lifetime activity of a single customer across the whole fact table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerActivity {
    pub customer_id: String,
    pub transaction_count: u32,
    pub total_spent: f64,
    pub avg_transaction_value: f64,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
}
