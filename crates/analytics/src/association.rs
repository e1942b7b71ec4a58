use crate::error::AnalyticsError;
use core_types::Transaction;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type Basket = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub product_a: String,
    pub product_b: String,
    /// Fraction of baskets containing both products.
    pub support: f64,
    pub lift: f64,
}

/// Pairwise association mining over transaction baskets.
#[derive(Debug, Clone, Copy)]
pub struct AssociationMiner {
    min_support: f64,
    min_lift: f64,
    max_rules: usize,
}

impl Default for AssociationMiner {
    fn default() -> Self {
        Self { min_support: 0.01, min_lift: 1.0, max_rules: 50 }
    }
}

/// Groups transaction rows into baskets keyed by transaction id. Rows without
/// a category contribute nothing; a category appears once per basket.
pub fn baskets_from_transactions(transactions: &[Transaction]) -> Vec<Basket> {
    let mut baskets: BTreeMap<&str, Basket> = BTreeMap::new();
    for txn in transactions {
        let basket = baskets.entry(txn.transaction_id.as_str()).or_default();
        if let Some(category) = txn.product_category.as_deref().filter(|c| !c.is_empty()) {
            basket.insert(category.to_string());
        }
    }
    baskets.into_values().collect()
}

impl AssociationMiner {
    pub fn new(min_support: f64, min_lift: f64, max_rules: usize) -> Result<Self, AnalyticsError> {
        if !(min_support > 0.0 && min_support <= 1.0) {
            return Err(AnalyticsError::InvalidSetting(
                "association_min_support",
                format!("must be in (0, 1], got {min_support}"),
            ));
        }
        if !min_lift.is_finite() || min_lift < 0.0 {
            return Err(AnalyticsError::InvalidSetting(
                "association_min_lift",
                format!("must be a non-negative number, got {min_lift}"),
            ));
        }
        Ok(Self { min_support, min_lift, max_rules })
    }

    /// Scores every co-occurring pair and keeps those meeting both the support
    /// and lift floors, strongest lift first.
    ///
    /// Empty baskets still count toward the total, so support is always
    /// relative to every transaction in the window.
    pub fn mine(&self, baskets: &[Basket]) -> Vec<AssociationRule> {
        let total = baskets.len() as f64;
        if baskets.is_empty() {
            return Vec::new();
        }

        let mut item_counts: HashMap<&str, usize> = HashMap::new();
        let mut pair_counts: HashMap<(&str, &str), usize> = HashMap::new();
        for basket in baskets {
            let items: Vec<&str> = basket.iter().map(String::as_str).collect();
            for (i, &a) in items.iter().enumerate() {
                *item_counts.entry(a).or_default() += 1;
                // Basket iteration is sorted, so `a < b` for every pair.
                for &b in &items[i + 1..] {
                    *pair_counts.entry((a, b)).or_default() += 1;
                }
            }
        }

        let mut rules: Vec<AssociationRule> = pair_counts
            .into_iter()
            .filter_map(|((a, b), joint)| {
                let support = joint as f64 / total;
                let p_a = item_counts[a] as f64 / total;
                let p_b = item_counts[b] as f64 / total;
                let lift = support / (p_a * p_b);
                (support >= self.min_support && lift >= self.min_lift).then(|| AssociationRule {
                    product_a: a.to_string(),
                    product_b: b.to_string(),
                    support,
                    lift,
                })
            })
            .collect();

        rules.sort_by(|x, y| {
            y.lift
                .partial_cmp(&x.lift)
                .unwrap_or(Ordering::Equal)
                .then_with(|| y.support.partial_cmp(&x.support).unwrap_or(Ordering::Equal))
                .then_with(|| x.product_a.cmp(&y.product_a))
                .then_with(|| x.product_b.cmp(&y.product_b))
        });
        rules.truncate(self.max_rules);
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::tests::txn;

    fn basket(items: &[&str]) -> Basket {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn always_together_has_unit_lift() {
        let baskets: Vec<_> = (0..10).map(|_| basket(&["A", "B"])).collect();
        let rules = AssociationMiner::default().mine(&baskets);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].product_a, "A");
        assert_eq!(rules[0].product_b, "B");
        assert_eq!(rules[0].support, 1.0);
        assert_eq!(rules[0].lift, 1.0);
    }

    #[test]
    fn rare_pair_below_one_percent_is_dropped() {
        let mut baskets: Vec<_> = (0..199).map(|_| basket(&["Bread"])).collect();
        baskets.push(basket(&["Caviar", "Truffle"]));
        // support 0.005 < 0.01 even though lift is huge
        assert!(AssociationMiner::default().mine(&baskets).is_empty());

        // a second occurrence crosses the floor
        baskets[0] = basket(&["Caviar", "Truffle"]);
        let rules = AssociationMiner::default().mine(&baskets);
        assert_eq!(rules.len(), 1);
        assert!((rules[0].support - 0.01).abs() < 1e-12);
        assert!(rules[0].lift > 1.0);
    }

    #[test]
    fn negative_association_is_dropped_and_results_sorted_by_lift() {
        let mut baskets = Vec::new();
        baskets.extend((0..4).map(|_| basket(&["Milk", "Cereal"])));
        baskets.extend((0..4).map(|_| basket(&["Milk"])));
        baskets.extend((0..2).map(|_| basket(&["Tea", "Lemon"])));
        baskets.extend((0..2).map(|_| basket(&["Tea", "Milk"])));
        baskets.extend((0..8).map(|_| basket(&["Bread"])));

        let rules = AssociationMiner::default().mine(&baskets);
        let pairs: Vec<_> = rules.iter().map(|r| (r.product_a.as_str(), r.product_b.as_str())).collect();

        // Lemon/Tea: 0.1 / (0.1 * 0.2) = 5; Cereal/Milk: 0.2 / (0.2 * 0.5) = 2;
        // Milk/Tea: 0.1 / (0.5 * 0.2) = 1.
        assert_eq!(pairs, vec![("Lemon", "Tea"), ("Cereal", "Milk"), ("Milk", "Tea")]);
        assert!(rules.windows(2).all(|w| w[0].lift >= w[1].lift));
    }

    #[test]
    fn baskets_group_rows_by_transaction() {
        let mut rows = vec![
            txn("T1", "C1", 5.0, "2024-01-01"),
            txn("T1", "C1", 7.0, "2024-01-01"),
            txn("T1", "C1", 9.0, "2024-01-01"),
            txn("T2", "C2", 3.0, "2024-01-01"),
        ];
        rows[0].product_category = Some("Snacks".to_string());
        rows[1].product_category = Some("Drinks".to_string());
        rows[2].product_category = Some("Snacks".to_string());

        let baskets = baskets_from_transactions(&rows);
        assert_eq!(baskets, vec![basket(&["Drinks", "Snacks"]), Basket::new()]);
    }

    #[test]
    fn rejects_out_of_range_settings() {
        assert!(AssociationMiner::new(0.0, 1.0, 10).is_err());
        assert!(AssociationMiner::new(1.5, 1.0, 10).is_err());
        assert!(AssociationMiner::new(0.05, -1.0, 10).is_err());
        assert!(AssociationMiner::default().mine(&[]).is_empty());
    }
}
