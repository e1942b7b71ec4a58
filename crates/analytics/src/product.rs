//! Product performance: sales, units, margin and price-band breakdowns over
//! grouped product rows.

use crate::stats;
use core_types::{PerformanceMetric, ProductSalesRow};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const TOP_PRODUCTS: usize = 10;

/// `(lower, upper)` average-price bounds; lower-inclusive, upper-exclusive.
const PRICE_BANDS: [(f64, Option<f64>); 5] = [
    (0.0, Some(10.0)),
    (10.0, Some(20.0)),
    (20.0, Some(50.0)),
    (50.0, Some(100.0)),
    (100.0, None),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRank {
    pub product_name: String,
    pub sales_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesAnalysis {
    pub total_sales: f64,
    pub average_sales: f64,
    pub top_products: Vec<SalesRank>,
    /// Share of total sales per category, in percent.
    pub category_distribution: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitsRank {
    pub product_name: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitsAnalysis {
    pub total_units: f64,
    pub average_units: f64,
    pub top_products: Vec<UnitsRank>,
    pub category_distribution: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginRank {
    pub product_name: String,
    pub margin: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginAnalysis {
    pub total_margin: f64,
    pub average_margin_pct: f64,
    pub top_products: Vec<MarginRank>,
    pub category_distribution: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBandStats {
    pub band: String,
    pub count: usize,
    pub total_sales: f64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBandAnalysis {
    /// Every band label, lowest first.
    pub price_bands: Vec<String>,
    /// Non-empty bands only, lowest first.
    pub distribution: Vec<PriceBandStats>,
}

/// The requested subset of analyses; absent metrics stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPerformance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitsAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<MarginAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_bands: Option<PriceBandAnalysis>,
}

pub fn price_band_label(lower: f64, upper: Option<f64>) -> String {
    match upper {
        Some(upper) => format!("${lower}-{upper}"),
        None => format!("${lower}-∞"),
    }
}

/// Rows ordered by `key` descending, name ascending on ties, truncated to
/// [`TOP_PRODUCTS`].
fn top_by<F>(rows: &[ProductSalesRow], key: F) -> Vec<&ProductSalesRow>
where
    F: Fn(&ProductSalesRow) -> f64,
{
    let mut ranked: Vec<&ProductSalesRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(TOP_PRODUCTS);
    ranked
}

fn category_distribution<F>(rows: &[ProductSalesRow], total: f64, key: F) -> BTreeMap<String, f64>
where
    F: Fn(&ProductSalesRow) -> f64,
{
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.category.clone()).or_default() += key(row);
    }
    sums.into_iter()
        .map(|(category, sum)| (category, stats::percentage(sum, total)))
        .collect()
}

fn margin_of(row: &ProductSalesRow) -> f64 {
    row.sales_amount - row.cost
}

fn margin_pct_of(row: &ProductSalesRow) -> f64 {
    stats::percentage(margin_of(row), row.sales_amount)
}

pub fn analyze_sales(rows: &[ProductSalesRow]) -> SalesAnalysis {
    let values: Vec<f64> = rows.iter().map(|r| r.sales_amount).collect();
    let total_sales: f64 = values.iter().sum();
    SalesAnalysis {
        total_sales,
        average_sales: stats::mean(&values),
        top_products: top_by(rows, |r| r.sales_amount)
            .into_iter()
            .map(|r| SalesRank { product_name: r.product_name.clone(), sales_amount: r.sales_amount })
            .collect(),
        category_distribution: category_distribution(rows, total_sales, |r| r.sales_amount),
    }
}

pub fn analyze_units(rows: &[ProductSalesRow]) -> UnitsAnalysis {
    let values: Vec<f64> = rows.iter().map(|r| r.quantity).collect();
    let total_units: f64 = values.iter().sum();
    UnitsAnalysis {
        total_units,
        average_units: stats::mean(&values),
        top_products: top_by(rows, |r| r.quantity)
            .into_iter()
            .map(|r| UnitsRank { product_name: r.product_name.clone(), quantity: r.quantity })
            .collect(),
        category_distribution: category_distribution(rows, total_units, |r| r.quantity),
    }
}

pub fn analyze_margin(rows: &[ProductSalesRow]) -> MarginAnalysis {
    let margins: Vec<f64> = rows.iter().map(margin_of).collect();
    let margin_pcts: Vec<f64> = rows.iter().map(margin_pct_of).collect();
    let total_margin: f64 = margins.iter().sum();
    MarginAnalysis {
        total_margin,
        average_margin_pct: stats::mean(&margin_pcts),
        top_products: top_by(rows, margin_of)
            .into_iter()
            .map(|r| MarginRank {
                product_name: r.product_name.clone(),
                margin: margin_of(r),
                margin_pct: margin_pct_of(r),
            })
            .collect(),
        category_distribution: category_distribution(rows, total_margin, margin_of),
    }
}

pub fn analyze_price_bands(rows: &[ProductSalesRow]) -> PriceBandAnalysis {
    // Rows without units sold have no meaningful unit price.
    let priced: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| r.quantity != 0.0)
        .map(|r| (r.sales_amount / r.quantity, r.sales_amount))
        .collect();

    let distribution = PRICE_BANDS
        .iter()
        .filter_map(|&(lower, upper)| {
            let members: Vec<&(f64, f64)> = priced
                .iter()
                .filter(|(price, _)| *price >= lower && upper.is_none_or(|u| *price < u))
                .collect();
            if members.is_empty() {
                return None;
            }
            let prices: Vec<f64> = members.iter().map(|(price, _)| *price).collect();
            Some(PriceBandStats {
                band: price_band_label(lower, upper),
                count: members.len(),
                total_sales: members.iter().map(|(_, sales)| sales).sum(),
                avg_price: stats::mean(&prices),
            })
        })
        .collect();

    PriceBandAnalysis {
        price_bands: PRICE_BANDS.iter().map(|&(l, u)| price_band_label(l, u)).collect(),
        distribution,
    }
}

/// Runs each requested analysis once, regardless of duplicates in `metrics`.
pub fn product_performance(rows: &[ProductSalesRow], metrics: &[PerformanceMetric]) -> ProductPerformance {
    let mut out = ProductPerformance::default();
    for metric in metrics {
        match metric {
            PerformanceMetric::Sales if out.sales.is_none() => out.sales = Some(analyze_sales(rows)),
            PerformanceMetric::Units if out.units.is_none() => out.units = Some(analyze_units(rows)),
            PerformanceMetric::Margin if out.margin.is_none() => out.margin = Some(analyze_margin(rows)),
            PerformanceMetric::PriceBands if out.price_bands.is_none() => {
                out.price_bands = Some(analyze_price_bands(rows))
            }
            _ => {}
        }
    }
    out
}
