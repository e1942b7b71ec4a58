use crate::DbError;
use chrono::NaiveDate;
use core_types::{CategoryLevel, CustomerActivity, DateRange, ProductSalesRow, Transaction, parse_txn_timestamp};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::future::Future;
use std::time::Duration;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(15);

const TRANSACTION_COLUMNS: &str = r#"
    CAST(t."Sales Txn Key" AS TEXT) AS transaction_id,
    CAST(t."Customer Key" AS TEXT) AS customer_id,
    CAST(t."Txn Date" AS TEXT) AS txn_date,
    CAST(COALESCE(t."Net Sales Amount", 0) AS REAL) AS amount,
    i."Item Category Desc" AS product_category,
    CAST(t."Unit of Measure" AS TEXT) AS payment_method,
    CAST(t."Location Code" AS TEXT) AS location
"#;

/// The `DbRepository` provides read-only access to the sales database. Every
/// query binds its values as parameters and runs under a per-query timeout.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl DbRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs `query` under the configured timeout. The pooled connection is
    /// released when the future is dropped, so a timeout never leaks one.
    async fn timed<T, F>(&self, name: &'static str, query: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => {
                tracing::warn!(query = name, timeout = ?self.query_timeout, "Query timed out");
                Err(DbError::QueryTimeout(name, self.query_timeout))
            }
        }
    }

    /// All transaction rows in the range, oldest first, for pattern and
    /// anomaly analysis.
    pub async fn get_transactions(&self, range: &DateRange) -> Result<Vec<Transaction>, DbError> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM "dbo_F_Sales_Transaction" t
            LEFT JOIN "dbo_D_Item" i ON t."Item Key" = i."Item Key"
            WHERE t."Txn Date" >= ? AND t."Txn Date" < ?
            ORDER BY t."Txn Date" ASC, t."Sales Txn Key" ASC, t."Item Key" ASC
            "#
        );
        let rows = self
            .timed(
                "get_transactions",
                sqlx::query(&sql)
                    .bind(range.start_bound())
                    .bind(range.end_bound())
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(decode_transactions("get_transactions", rows))
    }

    /// Transaction rows in the range, optionally restricted to customers whose
    /// type is one of `segments`. An empty slice means no restriction.
    pub async fn get_customer_transactions(
        &self,
        range: &DateRange,
        segments: &[String],
    ) -> Result<Vec<Transaction>, DbError> {
        let mut sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM "dbo_F_Sales_Transaction" t
            LEFT JOIN "dbo_D_Item" i ON t."Item Key" = i."Item Key"
            LEFT JOIN "dbo_D_Customer" c ON t."Customer Key" = c."Customer Key"
            WHERE t."Txn Date" >= ? AND t."Txn Date" < ?
            "#
        );
        if !segments.is_empty() {
            // Only placeholders are spliced in; the values are bound below.
            let placeholders = vec!["?"; segments.len()].join(", ");
            sql.push_str(&format!(r#" AND c."Customer Type Desc" IN ({placeholders})"#));
        }
        sql.push_str(r#" ORDER BY t."Customer Key" ASC, t."Txn Date" ASC"#);

        let mut query = sqlx::query(&sql).bind(range.start_bound()).bind(range.end_bound());
        for segment in segments {
            query = query.bind(segment.as_str());
        }
        let rows = self.timed("get_customer_transactions", query.fetch_all(&self.pool)).await?;
        Ok(decode_transactions("get_customer_transactions", rows))
    }

    /// Sales, quantity and cost grouped at `level`, skipping deleted and
    /// excluded rows. Groups whose sales fall below `min_sales` are dropped.
    pub async fn get_product_sales(
        &self,
        range: &DateRange,
        level: CategoryLevel,
        min_sales: Option<f64>,
    ) -> Result<Vec<ProductSalesRow>, DbError> {
        let (columns, group_by) = match level {
            CategoryLevel::Product => (
                r#"CAST(t."Item Key" AS TEXT) AS product_id,
                   COALESCE(i."Item Desc", CAST(t."Item Key" AS TEXT), 'Unknown') AS product_name,
                   COALESCE(i."Item Category Desc", 'Uncategorized') AS category,
                   i."Item Subcategory Desc" AS subcategory"#,
                r#"t."Item Key""#,
            ),
            CategoryLevel::Category => (
                r#"NULL AS product_id,
                   COALESCE(i."Item Category Desc", 'Uncategorized') AS product_name,
                   COALESCE(i."Item Category Desc", 'Uncategorized') AS category,
                   NULL AS subcategory"#,
                r#"i."Item Category Desc""#,
            ),
            CategoryLevel::Subcategory => (
                r#"NULL AS product_id,
                   COALESCE(i."Item Subcategory Desc", 'Unspecified') AS product_name,
                   COALESCE(i."Item Category Desc", 'Uncategorized') AS category,
                   i."Item Subcategory Desc" AS subcategory"#,
                r#"i."Item Category Desc", i."Item Subcategory Desc""#,
            ),
        };
        let sql = format!(
            r#"
            SELECT {columns},
                   CAST(COALESCE(SUM(t."Net Sales Amount"), 0) AS REAL) AS sales_amount,
                   CAST(COALESCE(SUM(t."Net Sales Quantity"), 0) AS REAL) AS quantity,
                   CAST(COALESCE(SUM(t."Cost Amount"), 0) AS REAL) AS cost
            FROM "dbo_F_Sales_Transaction" t
            LEFT JOIN "dbo_D_Item" i ON t."Item Key" = i."Item Key"
            WHERE t."Txn Date" >= ? AND t."Txn Date" < ?
              AND COALESCE(t."Deleted Flag", 0) = 0
              AND COALESCE(t."Excluded Flag", 0) = 0
            GROUP BY {group_by}
            HAVING COALESCE(SUM(t."Net Sales Amount"), 0) >= ?
            ORDER BY sales_amount DESC, product_name ASC
            "#
        );

        let rows = self
            .timed(
                "get_product_sales",
                sqlx::query(&sql)
                    .bind(range.start_bound())
                    .bind(range.end_bound())
                    .bind(min_sales.unwrap_or(f64::MIN))
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ProductSalesRow {
                    product_id: row.try_get("product_id")?,
                    product_name: row.try_get("product_name")?,
                    category: row.try_get("category")?,
                    subcategory: row.try_get("subcategory")?,
                    sales_amount: row.try_get("sales_amount")?,
                    quantity: row.try_get("quantity")?,
                    cost: row.try_get("cost")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(DbError::from)
    }

    /// Lifetime activity for every customer in the fact table.
    pub async fn get_customer_activity(&self) -> Result<Vec<CustomerActivity>, DbError> {
        let rows = self
            .timed(
                "get_customer_activity",
                sqlx::query(
                    r#"
                    SELECT CAST(t."Customer Key" AS TEXT) AS customer_id,
                           COUNT(*) AS transaction_count,
                           CAST(COALESCE(SUM(t."Net Sales Amount"), 0) AS REAL) AS total_spent,
                           CAST(COALESCE(AVG(t."Net Sales Amount"), 0) AS REAL) AS avg_transaction_value,
                           CAST(MIN(t."Txn Date") AS TEXT) AS first_purchase,
                           CAST(MAX(t."Txn Date") AS TEXT) AS last_purchase
                    FROM "dbo_F_Sales_Transaction" t
                    WHERE t."Customer Key" IS NOT NULL
                    GROUP BY t."Customer Key"
                    ORDER BY t."Customer Key" ASC
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .await?;

        let mut activity = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in &rows {
            let first: Option<String> = row.try_get("first_purchase")?;
            let last: Option<String> = row.try_get("last_purchase")?;
            let (Some(first_purchase), Some(last_purchase)) = (
                first.as_deref().and_then(parse_txn_timestamp),
                last.as_deref().and_then(parse_txn_timestamp),
            ) else {
                skipped += 1;
                continue;
            };
            let count: i64 = row.try_get("transaction_count")?;
            activity.push(CustomerActivity {
                customer_id: row.try_get("customer_id")?,
                transaction_count: u32::try_from(count).unwrap_or(u32::MAX),
                total_spent: row.try_get("total_spent")?,
                avg_transaction_value: row.try_get("avg_transaction_value")?,
                first_purchase,
                last_purchase,
            });
        }
        if skipped > 0 {
            tracing::warn!(skipped, "Skipped customers with unparseable transaction dates");
        }
        Ok(activity)
    }

    /// The date of the most recent transaction, or `None` for an empty table.
    pub async fn get_latest_transaction_date(&self) -> Result<Option<NaiveDate>, DbError> {
        let latest: Option<String> = self
            .timed(
                "get_latest_transaction_date",
                sqlx::query_scalar(r#"SELECT CAST(MAX("Txn Date") AS TEXT) FROM "dbo_F_Sales_Transaction""#)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(latest.as_deref().and_then(parse_txn_timestamp).map(|ts| ts.date()))
    }
}

/// Decodes transaction rows, dropping any whose key columns are missing or
/// whose date cannot be parsed.
fn decode_transactions(query: &'static str, rows: Vec<SqliteRow>) -> Vec<Transaction> {
    let total = rows.len();
    let transactions: Vec<Transaction> = rows.iter().filter_map(decode_transaction).collect();
    if transactions.len() < total {
        tracing::warn!(query, skipped = total - transactions.len(), "Skipped malformed transaction rows");
    }
    transactions
}

fn decode_transaction(row: &SqliteRow) -> Option<Transaction> {
    let date: Option<String> = row.try_get("txn_date").ok()?;
    Some(Transaction {
        transaction_id: row.try_get::<Option<String>, _>("transaction_id").ok()??,
        customer_id: row.try_get::<Option<String>, _>("customer_id").ok()??,
        timestamp: parse_txn_timestamp(date.as_deref()?)?,
        amount: row.try_get("amount").ok()?,
        product_category: row.try_get("product_category").ok()?,
        payment_method: row.try_get("payment_method").ok()?,
        location: row.try_get("location").ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{memory_pool, seeded_pool};

    fn january() -> DateRange {
        DateRange::parse(Some("2024-01-01"), Some("2024-01-31"), "start", "end").unwrap()
    }

    async fn repo() -> DbRepository {
        DbRepository::new(seeded_pool().await.unwrap())
    }

    #[tokio::test]
    async fn transactions_in_range_are_ordered_and_joined() {
        let txns = repo().await.get_transactions(&january()).await.unwrap();

        assert_eq!(txns.len(), 6);
        assert!(txns.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(txns[0].transaction_id, "1");
        assert_eq!(txns[0].product_category.as_deref(), Some("Coffee"));
        assert_eq!(txns[0].payment_method.as_deref(), Some("Card"));

        // A `T`-separated timestamp late on the end date is still in range.
        let last = txns.last().unwrap();
        assert_eq!(last.customer_id, "C2");
        assert_eq!(last.timestamp.to_string(), "2024-01-31 23:30:00");
        assert_eq!(last.payment_method, None);
    }

    #[tokio::test]
    async fn customer_segments_are_bound_as_a_list() {
        let repo = repo().await;

        let wholesale = repo
            .get_customer_transactions(&january(), &["Wholesale".to_string()])
            .await
            .unwrap();
        assert_eq!(wholesale.len(), 2);
        assert!(wholesale.iter().all(|t| t.customer_id == "C3"));

        let both = repo
            .get_customer_transactions(&january(), &["Retail".to_string(), "Wholesale".to_string()])
            .await
            .unwrap();
        let unfiltered = repo.get_customer_transactions(&january(), &[]).await.unwrap();
        assert_eq!(both.len(), 6);
        assert_eq!(unfiltered.len(), 6);

        // Segment values are data, never SQL.
        let hostile = repo
            .get_customer_transactions(&january(), &["x') OR 1=1 --".to_string()])
            .await
            .unwrap();
        assert!(hostile.is_empty());
    }

    #[tokio::test]
    async fn product_sales_skip_deleted_rows_and_apply_threshold() {
        let repo = repo().await;

        let products = repo
            .get_product_sales(&january(), CategoryLevel::Product, None)
            .await
            .unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product_name, "Espresso Beans");
        assert_eq!(products[0].product_id.as_deref(), Some("I1"));
        assert_eq!(products[0].sales_amount, 450.0);
        assert_eq!(products[0].quantity, 45.0);
        assert_eq!(products[0].cost, 270.0);
        assert_eq!(products[1].sales_amount, 60.0);

        let above = repo
            .get_product_sales(&january(), CategoryLevel::Product, Some(100.0))
            .await
            .unwrap();
        assert_eq!(above.len(), 1);

        let categories = repo
            .get_product_sales(&january(), CategoryLevel::Category, None)
            .await
            .unwrap();
        let names: Vec<_> = categories.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Homeware"]);
        assert!(categories.iter().all(|r| r.product_id.is_none()));

        let subcategories = repo
            .get_product_sales(&january(), CategoryLevel::Subcategory, None)
            .await
            .unwrap();
        let names: Vec<_> = subcategories.iter().map(|r| r.product_name.as_str()).collect();
        assert_eq!(names, vec!["Whole Bean", "Unspecified"]);
    }

    #[tokio::test]
    async fn customer_activity_spans_the_whole_table() {
        let repo = repo().await;
        let activity = repo.get_customer_activity().await.unwrap();

        assert_eq!(activity.len(), 3);
        let c1 = &activity[0];
        assert_eq!(c1.customer_id, "C1");
        assert_eq!(c1.transaction_count, 3);
        assert_eq!(c1.total_spent, 65.0);
        assert_eq!(c1.first_purchase.to_string(), "2024-01-02 09:15:00");

        let c2 = &activity[1];
        assert_eq!(c2.first_purchase.to_string(), "2024-01-31 23:30:00");
        assert_eq!(c2.last_purchase.to_string(), "2024-02-10 12:00:00");

        let latest = repo.get_latest_transaction_date().await.unwrap();
        assert_eq!(latest, NaiveDate::from_ymd_opt(2024, 2, 10));
    }

    #[tokio::test]
    async fn empty_tables_yield_empty_results() {
        let repo = DbRepository::new(memory_pool().await.unwrap());
        assert!(repo.get_transactions(&january()).await.unwrap().is_empty());
        assert!(repo.get_customer_activity().await.unwrap().is_empty());
        assert_eq!(repo.get_latest_transaction_date().await.unwrap(), None);
    }

    #[tokio::test]
    async fn slow_query_fails_with_timeout() {
        let repo = DbRepository::new(memory_pool().await.unwrap()).with_query_timeout(Duration::from_millis(10));
        let err = repo
            .timed("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, sqlx::Error>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryTimeout("slow", _)));
    }

    #[test]
    fn pool_exhaustion_maps_to_pool_timeout() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolTimeout));
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::QueryError(_)));
    }
}
