use chrono::{NaiveDate, NaiveDateTime};
use core_types::Transaction;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Per-customer statistics derived from a transaction set.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: String,
    /// Number of transactions.
    pub frequency: u32,
    /// Whole days between the last transaction and the reference date.
    /// Never negative.
    pub recency_days: i64,
    /// Mean transaction value.
    pub monetary: f64,
    pub total_spent: f64,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
    /// Mean gap between consecutive purchases, in fractional days.
    /// `None` for single-purchase customers.
    pub avg_interval_days: Option<f64>,
}

/// Groups transactions by customer, ordered by customer id.
///
/// `reference` is the date recency is measured against, normally the end
/// of the requested range.
pub fn aggregate_customers(transactions: &[Transaction], reference: NaiveDate) -> Vec<CustomerAggregate> {
    let mut grouped: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for txn in transactions {
        grouped.entry(txn.customer_id.as_str()).or_default().push(txn);
    }

    grouped
        .into_iter()
        .map(|(customer_id, txns)| {
            let mut timestamps: Vec<NaiveDateTime> = txns.iter().map(|t| t.timestamp).collect();
            timestamps.sort();

            let total_spent: f64 = txns.iter().map(|t| t.amount).sum();
            let frequency = txns.len() as u32;
            // A group always holds at least one transaction.
            let first_purchase = timestamps[0];
            let last_purchase = timestamps[timestamps.len() - 1];

            let avg_interval_days = if timestamps.len() > 1 {
                let gaps: f64 = timestamps
                    .windows(2)
                    .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
                    .sum();
                Some(gaps / (timestamps.len() - 1) as f64)
            } else {
                None
            };

            CustomerAggregate {
                customer_id: customer_id.to_string(),
                frequency,
                recency_days: (reference - last_purchase.date()).num_days().max(0),
                monetary: total_spent / frequency as f64,
                total_spent,
                first_purchase,
                last_purchase,
                avg_interval_days,
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a transaction at midnight on `date` (`YYYY-MM-DD`).
    pub(crate) fn txn(id: &str, customer: &str, amount: f64, date: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            customer_id: customer.to_string(),
            timestamp: core_types::parse_txn_timestamp(date).expect("valid test date"),
            amount,
            product_category: None,
            payment_method: None,
            location: None,
        }
    }

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn aggregates_per_customer() {
        let txns = vec![
            txn("1", "C1", 50.0, "2024-01-01"),
            txn("2", "C1", 150.0, "2024-02-01"),
            txn("3", "C2", 50.0, "2024-01-15"),
        ];
        let customers = aggregate_customers(&txns, date("2024-02-11"));

        assert_eq!(customers.len(), 2);
        let c1 = &customers[0];
        assert_eq!(c1.customer_id, "C1");
        assert_eq!(c1.frequency, 2);
        assert_eq!(c1.monetary, 100.0);
        assert_eq!(c1.total_spent, 200.0);
        assert_eq!(c1.recency_days, 10);
        assert_eq!(c1.avg_interval_days, Some(31.0));

        let c2 = &customers[1];
        assert_eq!(c2.frequency, 1);
        assert_eq!(c2.avg_interval_days, None);
        assert_eq!(c2.recency_days, 27);
    }

    #[test]
    fn purchases_after_reference_clamp_recency_to_zero() {
        let txns = vec![txn("1", "C1", 10.0, "2024-03-01")];
        let customers = aggregate_customers(&txns, date("2024-01-01"));
        assert_eq!(customers[0].recency_days, 0);
    }

    #[test]
    fn empty_input_yields_no_customers() {
        assert!(aggregate_customers(&[], date("2024-01-01")).is_empty());
    }
}
