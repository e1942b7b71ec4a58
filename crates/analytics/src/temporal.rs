use crate::anomaly::WEEKDAYS;
use crate::stats;
use chrono::{Datelike, Timelike};
use core_types::Transaction;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapCell {
    pub day: String,
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStats {
    pub total_transactions: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub unique_customers: usize,
    /// Busiest hour of day; the earliest wins a tie. `None` on empty input.
    pub peak_hour: Option<u32>,
    /// Busiest weekday, Monday first on a tie. `None` on empty input.
    pub peak_day: Option<String>,
}

fn counts_by_slot(transactions: &[Transaction]) -> [[usize; 24]; 7] {
    let mut grid = [[0usize; 24]; 7];
    for txn in transactions {
        let day = txn.timestamp.weekday().num_days_from_monday() as usize;
        grid[day][txn.timestamp.hour() as usize] += 1;
    }
    grid
}

/// Index of the first maximum; `max_by_key` would keep the last one.
fn first_peak(counts: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, &count) in counts.iter().enumerate() {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((i, count));
        }
    }
    best.map(|(i, _)| i)
}

/// Transaction counts for every (weekday, hour) slot: 168 cells, weekday-major.
pub fn temporal_heatmap(transactions: &[Transaction]) -> Vec<HeatmapCell> {
    let grid = counts_by_slot(transactions);
    WEEKDAYS
        .iter()
        .zip(grid)
        .flat_map(|(day, hours)| {
            hours.into_iter().enumerate().map(move |(hour, count)| HeatmapCell {
                day: day.to_string(),
                hour: hour as u32,
                count,
            })
        })
        .collect()
}

pub fn transaction_stats(transactions: &[Transaction]) -> TransactionStats {
    let values: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let unique_customers = transactions
        .iter()
        .map(|t| t.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let (peak_hour, peak_day) = if transactions.is_empty() {
        (None, None)
    } else {
        let grid = counts_by_slot(transactions);
        let per_hour: Vec<usize> = (0..24).map(|h| grid.iter().map(|day| day[h]).sum()).collect();
        let per_day: Vec<usize> = grid.iter().map(|day| day.iter().sum()).collect();
        (
            first_peak(&per_hour).map(|h| h as u32),
            first_peak(&per_day).map(|d| WEEKDAYS[d].to_string()),
        )
    };

    TransactionStats {
        total_transactions: transactions.len(),
        total_value: values.iter().sum(),
        average_value: stats::mean(&values),
        unique_customers,
        peak_hour,
        peak_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::tests::txn;
    use chrono::Duration;

    fn at_hour(id: &str, customer: &str, amount: f64, date: &str, hour: i64) -> Transaction {
        let mut t = txn(id, customer, amount, date);
        t.timestamp += Duration::hours(hour);
        t
    }

    #[test]
    fn heatmap_covers_every_slot() {
        // 2024-01-01 is a Monday, 2024-01-07 a Sunday.
        let txns = vec![
            at_hour("1", "A", 10.0, "2024-01-01", 9),
            at_hour("2", "B", 10.0, "2024-01-01", 9),
            at_hour("3", "A", 10.0, "2024-01-07", 23),
        ];
        let cells = temporal_heatmap(&txns);

        assert_eq!(cells.len(), 7 * 24);
        assert_eq!(cells[9], HeatmapCell { day: "Mon".to_string(), hour: 9, count: 2 });
        assert_eq!(cells[6 * 24 + 23], HeatmapCell { day: "Sun".to_string(), hour: 23, count: 1 });
        assert_eq!(cells.iter().map(|c| c.count).sum::<usize>(), 3);
    }

    #[test]
    fn stats_summarize_window() {
        let txns = vec![
            at_hour("1", "A", 10.0, "2024-01-02", 18),
            at_hour("2", "B", 30.0, "2024-01-02", 18),
            at_hour("3", "A", 20.0, "2024-01-05", 8),
        ];
        let s = transaction_stats(&txns);

        assert_eq!(s.total_transactions, 3);
        assert_eq!(s.total_value, 60.0);
        assert_eq!(s.average_value, 20.0);
        assert_eq!(s.unique_customers, 2);
        assert_eq!(s.peak_hour, Some(18));
        assert_eq!(s.peak_day.as_deref(), Some("Tue"));
    }

    #[test]
    fn ties_resolve_to_earliest_slot() {
        let txns = vec![
            at_hour("1", "A", 1.0, "2024-01-04", 15),
            at_hour("2", "A", 1.0, "2024-01-02", 11),
        ];
        let s = transaction_stats(&txns);
        assert_eq!(s.peak_hour, Some(11));
        assert_eq!(s.peak_day.as_deref(), Some("Tue"));
    }

    #[test]
    fn empty_window_has_no_peaks() {
        let s = transaction_stats(&[]);
        assert_eq!(s.total_transactions, 0);
        assert_eq!(s.average_value, 0.0);
        assert_eq!(s.peak_hour, None);
        assert_eq!(s.peak_day, None);
        assert_eq!(temporal_heatmap(&[]).len(), 168);
    }
}
